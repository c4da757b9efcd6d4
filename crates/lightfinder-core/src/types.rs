//! Core types for the lightfinder address resolver.
//!
//! Devices are keyed by their hardware identifier, which is canonicalised to
//! lowercase text, and mapped to the network address their last response
//! arrived from.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Stable hardware identifier of a device (usually its MAC address).
///
/// The inner text is always ASCII-lowercased, so two identifiers are equal
/// exactly when their canonical forms are equal. Surrounding whitespace is
/// kept: a padded identifier names a different device.
///
/// # Examples
///
/// ```
/// use lightfinder_core::types::DeviceId;
///
/// let a: DeviceId = "AA:BB:CC".parse().unwrap();
/// let b: DeviceId = "aa:bb:cc".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "aa:bb:cc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Normalises `raw` into a canonical identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ParseError> {
        let canonical = raw.as_ref().to_ascii_lowercase();
        if canonical.is_empty() {
            return Err(ParseError::EmptyIdentifier);
        }
        Ok(Self(canonical))
    }

    /// Returns the canonical textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// Network address a device was last seen at.
///
/// No validation is applied beyond non-emptiness; addresses normally come
/// straight from the source of a response datagram.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Creates an address from free text.
    pub fn new(raw: impl Into<String>) -> Result<Self, ParseError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ParseError::EmptyAddress);
        }
        Ok(Self(raw))
    }

    /// Returns the address text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<IpAddr> for DeviceAddress {
    fn from(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceAddress {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceAddress> for String {
    fn from(addr: DeviceAddress) -> Self {
        addr.0
    }
}
