//! Query service: the operations the HTTP surface exposes over the registry

use crate::types::ResolveResponse;
use lightfinder_core::{DeviceId, Registry, RegistrySnapshot};
use lightfinder_discovery::SchedulerHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Answers address queries and forwards refresh and shutdown requests.
///
/// Cheap to clone; every handler gets its own copy.
#[derive(Clone)]
pub struct QueryService {
    registry: Registry,
    scheduler: SchedulerHandle,
    shutdown: CancellationToken,
}

impl QueryService {
    pub fn new(
        registry: Registry,
        scheduler: SchedulerHandle,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            scheduler,
            shutdown,
        }
    }

    /// Looks up the current address for `identifier`.
    ///
    /// A missing identifier yields the invalid shape; anything else, including
    /// an empty string, is a plain lookup that may come back not found.
    pub fn resolve(&self, identifier: Option<&str>) -> ResolveResponse {
        let Some(raw) = identifier else {
            return ResolveResponse::invalid();
        };

        let Ok(id) = DeviceId::new(raw) else {
            debug!(identifier = raw, "Empty identifier");
            return ResolveResponse::not_found();
        };

        match self.registry.get(&id) {
            Some(address) => {
                debug!(device = %id, address = %address, "Resolved");
                ResolveResponse::found(address)
            }
            None => {
                debug!(device = %id, "Not found");
                ResolveResponse::not_found()
            }
        }
    }

    /// Returns every known identifier and address.
    pub fn list_all(&self) -> RegistrySnapshot {
        self.registry.snapshot()
    }

    /// Triggers an enumeration round without waiting for results.
    pub fn refresh_now(&self) {
        info!(enumerators = self.scheduler.enumerator_count(), "Refresh requested");
        self.scheduler.refresh();
    }

    /// Signals process termination.
    pub fn shutdown(&self) {
        info!("Stop requested");
        self.scheduler.shutdown();
        self.shutdown.cancel();
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
