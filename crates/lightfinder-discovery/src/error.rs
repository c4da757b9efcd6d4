//! Error types for the discovery crate

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for discovery operations
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors that can occur while enumerating devices
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Listening socket could not be created or bound
    #[error("Failed to bind discovery socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Broadcast request could not be transmitted
    #[error("Failed to send discovery request to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Invalid enumerator configuration
    #[error("Invalid discovery configuration: {0}")]
    InvalidConfig(String),

    /// Request payload could not be encoded
    #[error("Failed to encode discovery request: {0}")]
    Encode(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiscoveryError {
    /// Returns true if the next scheduled enumeration may succeed without
    /// any intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, DiscoveryError::Send { .. } | DiscoveryError::Io(_))
    }
}
