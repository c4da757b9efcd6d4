//! Configuration types for device discovery

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// Well-known UDP port Wiz devices listen and answer on
pub const WIZ_PORT: u16 = 38899;

/// Configuration for the discovery scheduler and its enumerators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// How often every enumerator re-broadcasts (seconds)
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,

    /// Wiz registration broadcast protocol
    #[serde(default)]
    pub wiz: WizConfig,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            polling_interval_secs: default_polling_interval(),
            wiz: WizConfig::default(),
        }
    }
}

impl DiscoveryConfig {
    /// Returns the polling interval as a Duration
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.polling_interval_secs == 0 {
            return Err("polling_interval_secs cannot be 0".to_string());
        }

        self.wiz.validate()
    }
}

/// Settings for the Wiz enumerator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizConfig {
    /// Register the Wiz enumerator at startup
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Subnet broadcast address the registration request is sent to
    #[serde(default = "default_broadcast_address")]
    pub broadcast_address: String,

    /// Port devices receive registration requests on
    #[serde(default = "default_wiz_port")]
    pub device_port: u16,

    /// Local port responses are received on (0 picks an ephemeral port)
    #[serde(default = "default_wiz_port")]
    pub listen_port: u16,

    /// `phoneIp` advertised in the registration request
    #[serde(default = "default_phone_ip")]
    pub phone_ip: String,

    /// `phoneMac` advertised in the registration request
    #[serde(default = "default_phone_mac")]
    pub phone_mac: String,
}

impl Default for WizConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            broadcast_address: default_broadcast_address(),
            device_port: default_wiz_port(),
            listen_port: default_wiz_port(),
            phone_ip: default_phone_ip(),
            phone_mac: default_phone_mac(),
        }
    }
}

impl WizConfig {
    /// Parses the broadcast address
    pub fn broadcast_ip(&self) -> Result<Ipv4Addr, String> {
        self.broadcast_address
            .parse()
            .map_err(|_| format!("invalid broadcast_address: {}", self.broadcast_address))
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.broadcast_ip()?;

        if self.device_port == 0 {
            return Err("device_port cannot be 0".to_string());
        }

        Ok(())
    }
}

// Default configuration values
fn default_polling_interval() -> u64 {
    3600 // one hour
}

fn default_enabled() -> bool {
    true
}

fn default_broadcast_address() -> String {
    "192.168.1.255".to_string()
}

fn default_wiz_port() -> u16 {
    WIZ_PORT
}

fn default_phone_ip() -> String {
    "127.0.0.0".to_string()
}

fn default_phone_mac() -> String {
    "BEEFDEADBEEF".to_string()
}
