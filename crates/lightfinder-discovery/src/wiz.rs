//! Wiz registration broadcast enumerator
//!
//! Wiz bulbs answer a JSON `registration` request sent to UDP port 38899 with
//! a datagram whose `result.mac` field carries the bulb's hardware address.
//! The source of that datagram is the bulb's current IP address.

use crate::config::WizConfig;
use crate::enumerator::Enumerator;
use crate::error::{DiscoveryError, Result};
use async_trait::async_trait;
use lightfinder_core::{DeviceAddress, DeviceId, Registry};
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

/// Largest datagram we expect from a device
const MAX_DATAGRAM_SIZE: usize = 2048;

/// Request id the devices echo back
const REGISTRATION_ID: u32 = 10;

/// Registration request body
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest {
    pub params: RegistrationParams,
    pub id: u32,
    pub method: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationParams {
    pub phone_ip: String,
    pub phone_mac: String,
    pub register: bool,
}

impl RegistrationRequest {
    pub fn new(phone_ip: impl Into<String>, phone_mac: impl Into<String>) -> Self {
        Self {
            params: RegistrationParams {
                phone_ip: phone_ip.into(),
                phone_mac: phone_mac.into(),
                register: true,
            },
            id: REGISTRATION_ID,
            method: "registration".to_string(),
        }
    }

    /// Encodes the request as compact JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Debug, Deserialize)]
struct RegistrationResponse {
    result: RegistrationResult,
}

#[derive(Debug, Deserialize)]
struct RegistrationResult {
    mac: String,
}

/// Extracts the device identifier from a response datagram.
///
/// Anything that is not JSON with a `result` object holding a non-empty
/// `mac` string yields `None`. That includes our own broadcast, which is
/// looped back to the listening socket.
pub fn parse_response(data: &[u8]) -> Option<DeviceId> {
    let response: RegistrationResponse = serde_json::from_slice(data).ok()?;
    DeviceId::new(response.result.mac).ok()
}

/// Records the device that sent `data` from `source`, if it is a valid response.
///
/// Returns the identifier that was written.
pub fn ingest_datagram(registry: &Registry, data: &[u8], source: SocketAddr) -> Option<DeviceId> {
    let Some(id) = parse_response(data) else {
        trace!(source = %source, len = data.len(), "Discarding unrecognised datagram");
        return None;
    };

    let address = DeviceAddress::from(source.ip());
    let previous = registry.set(id.clone(), address.clone());

    match previous {
        Some(ref old) if *old == address => {
            debug!(device = %id, address = %address, "Device confirmed");
        }
        Some(old) => {
            info!(device = %id, address = %address, previous = %old, "Device moved");
        }
        None => {
            info!(device = %id, address = %address, "Device discovered");
        }
    }

    Some(id)
}

/// Creates the broadcast-capable listening socket.
fn bind_socket(addr: SocketAddr) -> std::io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;

    Ok(socket.into())
}

/// Enumerator for Wiz bulbs
pub struct WizEnumerator {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    request: Vec<u8>,
    cancel: CancellationToken,
}

impl WizEnumerator {
    /// Binds the listening socket and starts ingesting responses into `registry`.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn bind(config: &WizConfig, registry: Registry) -> Result<Self> {
        let broadcast = config.broadcast_ip().map_err(DiscoveryError::InvalidConfig)?;
        let target = SocketAddr::new(IpAddr::V4(broadcast), config.device_port);
        let request = RegistrationRequest::new(&config.phone_ip, &config.phone_mac).to_bytes()?;

        let listen = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.listen_port);
        let std_socket =
            bind_socket(listen).map_err(|source| DiscoveryError::Bind { addr: listen, source })?;
        let socket = Arc::new(
            UdpSocket::from_std(std_socket)
                .map_err(|source| DiscoveryError::Bind { addr: listen, source })?,
        );

        info!(
            local = %socket.local_addr()?,
            target = %target,
            "Wiz enumerator listening"
        );

        let cancel = CancellationToken::new();
        tokio::spawn(receive_loop(socket.clone(), registry, cancel.clone()));

        Ok(Self {
            socket,
            target,
            request,
            cancel,
        })
    }

    /// Address the listening socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

#[async_trait]
impl Enumerator for WizEnumerator {
    fn name(&self) -> &str {
        "wiz"
    }

    #[instrument(skip(self), fields(target = %self.target))]
    async fn query(&self) -> Result<()> {
        self.socket
            .send_to(&self.request, self.target)
            .await
            .map_err(|source| DiscoveryError::Send {
                target: self.target,
                source,
            })?;

        debug!(bytes = self.request.len(), "Registration broadcast sent");
        Ok(())
    }

    fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for WizEnumerator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, registry: Registry, cancel: CancellationToken) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break;
            }
            result = socket.recv_from(&mut buf) => match result {
                Ok((len, source)) => {
                    ingest_datagram(&registry, &buf[..len], source);
                }
                Err(e) => {
                    warn!(error = %e, "UDP receive error");
                }
            }
        }
    }

    debug!("Wiz receive task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn source(ip: &str) -> SocketAddr {
        SocketAddr::new(ip.parse().unwrap(), WIZ_TEST_PORT)
    }

    const WIZ_TEST_PORT: u16 = 38899;

    #[test]
    fn test_default_request_bytes() {
        let bytes = RegistrationRequest::new("127.0.0.0", "BEEFDEADBEEF")
            .to_bytes()
            .unwrap();
        let expected = concat!(
            r#"{"params":{"phoneIp":"127.0.0.0","phoneMac":"BEEFDEADBEEF","register":true},"#,
            r#""id":10,"method":"registration"}"#,
        );
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), expected);
    }

    #[test]
    fn test_parse_response() {
        let datagram = concat!(
            r#"{"method":"registration","env":"pro","#,
            r#""result":{"mac":"A8BB50E0F12C","success":true}}"#,
        );
        let id = parse_response(datagram.as_bytes());
        assert_eq!(id.unwrap().as_str(), "a8bb50e0f12c");
    }

    #[test]
    fn test_parse_rejects_unrelated_datagrams() {
        let request = RegistrationRequest::new("127.0.0.0", "BEEFDEADBEEF")
            .to_bytes()
            .unwrap();

        assert!(parse_response(&request).is_none());
        assert!(parse_response(b"").is_none());
        assert!(parse_response(b"\xff\xfe garbage").is_none());
        assert!(parse_response(br#"{"result":true}"#).is_none());
        assert!(parse_response(br#"{"result":{"success":true}}"#).is_none());
        assert!(parse_response(br#"{"result":{"mac":""}}"#).is_none());
        assert!(parse_response(br#"{"result":{"mac":42}}"#).is_none());
        assert!(parse_response(br#"{"error":{"code":-32601}}"#).is_none());
    }

    #[test]
    fn test_ingest_records_source_ip() {
        let registry = Registry::new();
        let id = ingest_datagram(
            &registry,
            br#"{"result":{"mac":"AA:BB:CC:DD:EE:FF"}}"#,
            source("10.0.0.5"),
        )
        .unwrap();

        assert_eq!(id.as_str(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(registry.get(&id).unwrap().as_str(), "10.0.0.5");
    }

    #[test]
    fn test_ingest_overwrites_moved_device() {
        let registry = Registry::new();
        let datagram = br#"{"result":{"mac":"AA:BB:CC:DD:EE:FF"}}"#;

        ingest_datagram(&registry, datagram, source("10.0.0.5"));
        let id = ingest_datagram(&registry, datagram, source("10.0.0.9")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().as_str(), "10.0.0.9");
    }

    #[test]
    fn test_ingest_ignores_datagram_without_marker() {
        let registry = Registry::new();
        let pulse = br#"{"method":"pulse","params":{}}"#;
        assert!(ingest_datagram(&registry, pulse, source("10.0.0.5")).is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_bad_broadcast_address_is_config_error() {
        let config = WizConfig {
            broadcast_address: "nowhere".to_string(),
            listen_port: 0,
            ..Default::default()
        };
        let result = WizEnumerator::bind(&config, Registry::new()).await;
        assert!(matches!(result, Err(DiscoveryError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        // A plain socket without SO_REUSEADDR keeps the port exclusive.
        let holder = std::net::UdpSocket::bind("0.0.0.0:0").unwrap();
        let port = holder.local_addr().unwrap().port();

        let config = WizConfig {
            listen_port: port,
            broadcast_address: "127.0.0.1".to_string(),
            ..Default::default()
        };
        let result = WizEnumerator::bind(&config, Registry::new()).await;
        assert!(matches!(result, Err(DiscoveryError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_query_reaches_device_and_response_is_ingested() {
        let device = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let registry = Registry::new();

        let config = WizConfig {
            broadcast_address: "127.0.0.1".to_string(),
            device_port: device.local_addr().unwrap().port(),
            listen_port: 0,
            ..Default::default()
        };
        let enumerator = WizEnumerator::bind(&config, registry.clone()).await.unwrap();
        enumerator.query().await.unwrap();

        let mut buf = [0u8; 512];
        let (len, from) = tokio::time::timeout(Duration::from_secs(2), device.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert!(std::str::from_utf8(&buf[..len]).unwrap().contains("\"method\":\"registration\""));

        device
            .send_to(br#"{"result":{"mac":"A8:BB:50:11:22:33"}}"#, from)
            .await
            .unwrap();

        let id = DeviceId::new("a8:bb:50:11:22:33").unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while registry.get(&id).is_none() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(registry.get(&id).unwrap().as_str(), "127.0.0.1");
        enumerator.shutdown();
    }
}
