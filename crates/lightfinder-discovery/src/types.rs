//! Shared discovery types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the scheduler fired an enumeration round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FireReason {
    /// First round after the scheduler starts
    Startup,
    /// Periodic polling tick
    Interval,
    /// Explicit refresh request
    Refresh,
}

impl fmt::Display for FireReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireReason::Startup => write!(f, "startup"),
            FireReason::Interval => write!(f, "interval"),
            FireReason::Refresh => write!(f, "refresh"),
        }
    }
}

/// Outcome of one enumeration round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireSummary {
    /// Enumerators whose request went out
    pub sent: usize,
    /// Enumerators whose request failed to send
    pub failed: usize,
}
