//! # Lightfinder Core
//!
//! Core types, the shared address registry, error handling, and configuration
//! for the lightfinder device address resolver.
//!
//! - **Types**: [`DeviceId`] (canonical lowercase hardware identifier) and
//!   [`DeviceAddress`] (last observed network address).
//! - **Registry**: [`Registry`], a cloneable handle to the identifier to address
//!   cache shared by enumerators and query handlers.
//! - **Configuration**: YAML files, environment variable overrides, and validation.
//!
//! ## Example
//!
//! ```
//! use lightfinder_core::{DeviceAddress, DeviceId, Registry};
//!
//! let registry = Registry::new();
//! registry.set(
//!     DeviceId::new("A8:BB:50:0E:F1:2C").unwrap(),
//!     DeviceAddress::new("192.168.1.31").unwrap(),
//! );
//!
//! let id = DeviceId::new("a8:bb:50:0e:f1:2c").unwrap();
//! assert_eq!(registry.get(&id).unwrap().as_str(), "192.168.1.31");
//! ```

pub mod config;
pub mod discovery_config;
pub mod error;
pub mod registry;
pub mod types;

pub use config::AppConfig;
pub use error::{CoreError, Result};
pub use registry::{Registry, RegistrySnapshot};
pub use types::{DeviceAddress, DeviceId};
