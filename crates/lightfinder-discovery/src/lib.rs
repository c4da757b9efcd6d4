//! Broadcast device discovery for lightfinder
//!
//! This crate turns hardware identifiers into current network addresses by
//! broadcasting protocol-specific discovery requests and harvesting the
//! answers into a shared [`Registry`](lightfinder_core::Registry):
//! - [`Enumerator`]: the capability each discovery protocol implements
//! - [`WizEnumerator`]: JSON-over-UDP registration broadcast for Wiz bulbs
//! - [`Scheduler`]: fires every enumerator at startup, periodically, and on demand
//!
//! # Architecture
//!
//! Each enumerator owns a listening socket and a receive task that writes
//! every recognised response into the registry. The scheduler never waits for
//! responses: firing a round only transmits requests. Discovery is lossy by
//! nature, so a dropped datagram is repaired by the next round and nothing
//! more.
//!
//! # Example
//!
//! ```no_run
//! use lightfinder_core::Registry;
//! use lightfinder_discovery::{build_enumerators, DiscoveryConfig, Scheduler};
//!
//! #[tokio::main]
//! async fn main() -> lightfinder_discovery::Result<()> {
//!     let config = DiscoveryConfig::default();
//!     let registry = Registry::new();
//!
//!     let enumerators = build_enumerators(&config, &registry).await?;
//!     let (handle, task) = Scheduler::new(enumerators, config.polling_interval()).spawn();
//!
//!     handle.refresh();
//!     handle.shutdown();
//!     let _ = task.await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod enumerator;
pub mod error;
pub mod scheduler;
pub mod types;
pub mod wiz;

pub use config::{DiscoveryConfig, WizConfig};
pub use enumerator::{build_enumerators, Enumerator};
pub use error::{DiscoveryError, Result};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use types::{FireReason, FireSummary};
pub use wiz::WizEnumerator;
