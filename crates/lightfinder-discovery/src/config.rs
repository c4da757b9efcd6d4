//! Configuration types for device discovery
//!
//! Re-exports configuration from lightfinder-core so the binary and this crate
//! share one definition

pub use lightfinder_core::discovery_config::{DiscoveryConfig, WizConfig, WIZ_PORT};
