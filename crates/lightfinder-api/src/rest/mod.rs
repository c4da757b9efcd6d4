//! REST endpoints using Axum

use crate::middleware::logging_middleware;
use crate::query::QueryService;
use crate::types::{ActionResponse, MacParam, ResolveResponse};
use axum::{
    extract::{RawQuery, State},
    routing::get,
    Json, Router,
};
use lightfinder_core::RegistrySnapshot;
use tower_http::trace::TraceLayer;
use tracing::warn;

// ============================================================================
// Router Setup
// ============================================================================

pub fn create_rest_router(service: QueryService) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/list", get(list_devices))
        .route("/resolve", get(resolve_device))
        .route("/refresh", get(refresh_devices))
        .route("/stop", get(stop_service))
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Liveness check
async fn liveness() -> &'static str {
    "ok"
}

/// GET /list - Every known identifier and its address
async fn list_devices(State(service): State<QueryService>) -> Json<RegistrySnapshot> {
    Json(service.list_all())
}

/// GET /resolve?mac=<identifier> - Current address of one device
///
/// Only the first `mac` value counts. A value that does not decode to UTF-8 is
/// answered like a missing `mac`.
async fn resolve_device(
    State(service): State<QueryService>,
    RawQuery(query): RawQuery,
) -> Json<ResolveResponse> {
    let mac = match MacParam::from_query(query.as_deref()) {
        MacParam::Value(mac) => Some(mac),
        MacParam::Missing => None,
        MacParam::Undecodable => {
            warn!(query = query.as_deref().unwrap_or_default(), "Undecodable mac parameter");
            None
        }
    };

    Json(service.resolve(mac.as_deref()))
}

/// GET /refresh - Start an enumeration round and return immediately
async fn refresh_devices(State(service): State<QueryService>) -> Json<ActionResponse> {
    service.refresh_now();
    Json(ActionResponse::ok())
}

/// GET /stop - Shut the process down
///
/// The server drains in-flight requests before exiting, so this response is
/// still delivered.
async fn stop_service(State(service): State<QueryService>) -> Json<ActionResponse> {
    service.shutdown();
    Json(ActionResponse::ok())
}
