//! Lightfinder API - HTTP query surface for the device address registry
//!
//! A thin adapter over [`QueryService`]:
//!
//! | Path       | Response                                      |
//! |------------|-----------------------------------------------|
//! | `/`        | `ok`                                          |
//! | `/list`    | `{"<identifier>":"<address>",...}`            |
//! | `/resolve` | `{"ip":<address or "not found">,"result":..}` |
//! | `/refresh` | `{"result":true}`, enumeration runs afterward |
//! | `/stop`    | `{"result":true}`, then the process exits     |
//!
//! # Example
//!
//! ```no_run
//! use lightfinder_api::{QueryService, Server, ServerConfig};
//! use lightfinder_core::Registry;
//! use lightfinder_discovery::Scheduler;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let shutdown = CancellationToken::new();
//!     let (scheduler, _task) = Scheduler::new(Vec::new(), Duration::from_secs(3600)).spawn();
//!     let service = QueryService::new(Registry::new(), scheduler, shutdown.clone());
//!
//!     Server::new(ServerConfig::default(), service).run(shutdown).await
//! }
//! ```

pub mod middleware;
pub mod query;
pub mod rest;
pub mod types;

pub use query::QueryService;
pub use types::{ActionResponse, ResolveResponse};

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// ============================================================================
// Server Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

pub struct Server {
    config: ServerConfig,
    service: QueryService,
}

impl Server {
    pub fn new(config: ServerConfig, service: QueryService) -> Self {
        Self { config, service }
    }

    /// Binds the listener and serves until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` is cancelled.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        let app = rest::create_rest_router(self.service);
        let local_addr = listener.local_addr()?;

        info!(address = %local_addr, "Server listening");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

        info!("Server shutdown complete");
        Ok(())
    }
}

// ============================================================================
// Graceful Shutdown
// ============================================================================

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl-C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
