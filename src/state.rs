// MIT License - Copyright (c) 2026 Peter Wright
// Shared snapshot store

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::devices::record::Snapshot;

/// Holds the single current [`Snapshot`].
///
/// The poll loop is the only writer; both gateways read. Snapshots are
/// shared as `Arc`s, so a reader keeps a consistent capture even while
/// the writer replaces the current one, and can never observe a torn
/// update or mutate the shared copy.
pub struct StateStore {
    current: RwLock<Arc<Snapshot>>,
}

impl StateStore {
    /// Create a store holding an empty snapshot.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// The current snapshot. Cheap: clones the `Arc`, not the records.
    pub async fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replace the current snapshot. The only mutation the store allows.
    pub async fn replace(&self, next: Arc<Snapshot>) {
        *self.current.write().await = next;
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::record::{DeviceKind, DeviceRecord};

    fn snapshot(charge: i32) -> Arc<Snapshot> {
        Arc::new(Snapshot::new(vec![DeviceRecord {
            kind: DeviceKind::Zone,
            id: 1,
            name: "Door".to_string(),
            signal: 50,
            temperature: 20,
            charge_value: charge,
        }]))
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let store = StateStore::new();
        assert!(store.current().await.is_empty());
    }

    #[tokio::test]
    async fn test_replace_supersedes() {
        let store = StateStore::new();
        store.replace(snapshot(90)).await;
        assert_eq!(store.current().await.records()[0].charge_value, 90);
        store.replace(snapshot(85)).await;
        assert_eq!(store.current().await.records()[0].charge_value, 85);
    }

    #[tokio::test]
    async fn test_reader_keeps_consistent_capture() {
        let store = StateStore::new();
        store.replace(snapshot(90)).await;
        let held = store.current().await;
        store.replace(snapshot(85)).await;
        // The earlier capture is unaffected by the replacement.
        assert_eq!(held.records()[0].charge_value, 90);
        assert_eq!(store.current().await.records()[0].charge_value, 85);
    }

    #[tokio::test]
    async fn test_concurrent_readers() {
        let store = Arc::new(StateStore::new());
        store.replace(snapshot(90)).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    let snap = store.current().await;
                    assert_eq!(snap.len(), 1);
                }
            }));
        }
        for _ in 0..100 {
            store.replace(snapshot(85)).await;
            store.replace(snapshot(90)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
