//! Response bodies of the HTTP query surface

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

/// `ip` value returned when the identifier is unknown
pub const NOT_FOUND: &str = "not found";

/// `ip` value returned when the request carried no usable identifier
pub const INVALID_REQUEST: &str = "invalid request";

// ============================================================================
// Resolve
// ============================================================================

/// Answer to a resolve request.
///
/// Serialises as `{"ip":<address or reason>,"result":<found>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub ip: String,
    pub result: bool,
}

impl ResolveResponse {
    pub fn found(address: impl Into<String>) -> Self {
        Self {
            ip: address.into(),
            result: true,
        }
    }

    pub fn not_found() -> Self {
        Self {
            ip: NOT_FOUND.to_string(),
            result: false,
        }
    }

    pub fn invalid() -> Self {
        Self {
            ip: INVALID_REQUEST.to_string(),
            result: false,
        }
    }
}

/// The `mac` parameter of a `/resolve` query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacParam {
    /// No `mac` key in the query
    Missing,
    /// The first `mac` value is not valid UTF-8 once percent-decoded
    Undecodable,
    /// The first `mac` value, decoded
    Value(String),
}

impl MacParam {
    /// Extracts the first `mac` value from a raw `application/x-www-form-urlencoded`
    /// query string. Later repeats of the key are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let Some(query) = query else {
            return Self::Missing;
        };

        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if decode_component(key).as_deref() != Some("mac") {
                continue;
            }

            return match decode_component(value) {
                Some(value) => Self::Value(value),
                None => Self::Undecodable,
            };
        }

        Self::Missing
    }
}

/// Percent-decodes one form component, `+` standing for a space.
fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

// ============================================================================
// Actions
// ============================================================================

/// Acknowledgement for `/refresh` and `/stop`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub result: bool,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self { result: true }
    }
}
