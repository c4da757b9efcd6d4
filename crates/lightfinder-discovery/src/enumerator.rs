//! The enumeration capability every discovery protocol implements.

use crate::config::DiscoveryConfig;
use crate::error::Result;
use crate::wiz::WizEnumerator;
use async_trait::async_trait;
use lightfinder_core::Registry;
use std::sync::Arc;
use tracing::info;

/// A protocol driver that broadcasts a discovery request and feeds the
/// answers it hears into a [`Registry`].
///
/// Implementations own their listening sockets and start receiving as soon as
/// they are constructed. `query` only transmits: responses are ingested by the
/// enumerator's own receive task, whenever they arrive.
#[async_trait]
pub trait Enumerator: Send + Sync {
    /// Short protocol name used in logs.
    fn name(&self) -> &str;

    /// Sends one discovery broadcast and returns once it has left the socket.
    async fn query(&self) -> Result<()>;

    /// Stops receiving responses and releases the listening socket.
    fn shutdown(&self);
}

/// Builds every enumerator enabled in `config`.
///
/// A socket that cannot be bound aborts construction: the caller cannot
/// discover devices through that protocol.
pub async fn build_enumerators(
    config: &DiscoveryConfig,
    registry: &Registry,
) -> Result<Vec<Arc<dyn Enumerator>>> {
    let mut enumerators: Vec<Arc<dyn Enumerator>> = Vec::new();

    if config.wiz.enabled {
        let wiz = WizEnumerator::bind(&config.wiz, registry.clone()).await?;
        enumerators.push(Arc::new(wiz));
    }

    info!(count = enumerators.len(), "Enumerators ready");
    Ok(enumerators)
}
