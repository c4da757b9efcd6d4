//! Shared identifier to address registry.
//!
//! A best-effort, in-memory cache written by enumerators as responses arrive
//! and read by query handlers. Entries are never evicted; a device that goes
//! offline keeps its last known address until it answers again from a new one
//! or the process restarts.

use crate::types::{DeviceAddress, DeviceId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Point-in-time copy of every registry entry.
pub type RegistrySnapshot = BTreeMap<DeviceId, DeviceAddress>;

/// Concurrency-safe mapping from [`DeviceId`] to [`DeviceAddress`].
///
/// Cloning is cheap and every clone observes the same entries.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Arc<RwLock<HashMap<DeviceId, DeviceAddress>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `addr` for `id`, replacing any previous entry.
    ///
    /// Returns the address that was replaced, if any.
    pub fn set(&self, id: DeviceId, addr: DeviceAddress) -> Option<DeviceAddress> {
        self.entries.write().insert(id, addr)
    }

    /// Looks up the current address for `id`.
    pub fn get(&self, id: &DeviceId) -> Option<DeviceAddress> {
        self.entries.read().get(id).cloned()
    }

    /// Returns a consistent copy of all entries.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.entries
            .read()
            .iter()
            .map(|(id, addr)| (id.clone(), addr.clone()))
            .collect()
    }

    /// Number of known devices.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True before the first device has answered.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DeviceId {
        DeviceId::new(s).unwrap()
    }

    fn addr(s: &str) -> DeviceAddress {
        DeviceAddress::new(s).unwrap()
    }

    #[test]
    fn test_set_then_get() {
        let registry = Registry::new();
        assert!(registry.get(&id("aa:bb:cc")).is_none());

        registry.set(id("aa:bb:cc"), addr("192.168.1.20"));
        assert_eq!(registry.get(&id("aa:bb:cc")), Some(addr("192.168.1.20")));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = Registry::new();
        registry.set(id("AA:BB:CC"), addr("192.168.1.20"));

        assert_eq!(registry.get(&id("aa:bb:cc")), Some(addr("192.168.1.20")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_writer_wins() {
        let registry = Registry::new();
        assert!(registry.set(id("aa:bb:cc"), addr("192.168.1.20")).is_none());

        let previous = registry.set(id("AA:BB:CC"), addr("192.168.1.42"));
        assert_eq!(previous, Some(addr("192.168.1.20")));
        assert_eq!(registry.get(&id("aa:bb:cc")), Some(addr("192.168.1.42")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = Registry::new();
        registry.set(id("aa"), addr("10.0.0.1"));

        let snapshot = registry.snapshot();
        registry.set(id("bb"), addr("10.0.0.2"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.snapshot().len(), 2);
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = Registry::new();
        let writer = registry.clone();
        writer.set(id("aa"), addr("10.0.0.1"));

        assert!(!registry.is_empty());
        assert_eq!(registry.get(&id("aa")), Some(addr("10.0.0.1")));
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let registry = Registry::new();

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for n in 0..250 {
                        let key = id(&format!("{:02X}:{:04X}", worker, n));
                        registry.set(key, addr(&format!("10.{}.{}.{}", worker, n / 256, n % 256)));
                        let _ = registry.snapshot();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 8 * 250);
        assert_eq!(registry.get(&id("07:00f9")), Some(addr("10.7.0.249")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks() {
        let registry = Registry::new();

        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    registry.set(id(&format!("dev-{n}")), addr(&format!("10.0.0.{n}")));
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 16);
        assert!(snapshot.keys().all(|k| k.as_str().starts_with("dev-")));
    }
}
