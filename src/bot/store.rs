//! Audit storage for inbound updates.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::telegram::Update;

/// Receives every handled update before its commands run.
///
/// Failures are logged by the robot and never stop dispatch.
#[async_trait]
pub trait UpdatesStore: Send + Sync {
    async fn save_update(&self, update: &Update, raw: &Value) -> anyhow::Result<()>;
}

/// A stored update record.
#[derive(Debug, Clone)]
pub struct StoredUpdate {
    pub update_id: i64,
    pub received_at: DateTime<Utc>,
    pub raw: Value,
}

/// Keeps the most recent updates in memory.
///
/// Once `capacity` records are held, the oldest is evicted.
#[derive(Debug)]
pub struct MemoryUpdatesStore {
    capacity: usize,
    updates: Mutex<VecDeque<StoredUpdate>>,
}

impl MemoryUpdatesStore {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            updates: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    pub async fn len(&self) -> usize {
        self.updates.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.updates.lock().await.is_empty()
    }

    /// Most recently stored update.
    pub async fn latest(&self) -> Option<StoredUpdate> {
        self.updates.lock().await.back().cloned()
    }

    /// All stored updates, oldest first.
    pub async fn snapshot(&self) -> Vec<StoredUpdate> {
        self.updates.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl UpdatesStore for MemoryUpdatesStore {
    async fn save_update(&self, update: &Update, raw: &Value) -> anyhow::Result<()> {
        let mut updates = self.updates.lock().await;
        if updates.len() == self.capacity {
            updates.pop_front();
        }
        updates.push_back(StoredUpdate {
            update_id: update.update_id,
            received_at: Utc::now(),
            raw: raw.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn save(store: &MemoryUpdatesStore, id: i64) {
        let raw = json!({ "update_id": id });
        let update: Update = serde_json::from_value(raw.clone()).unwrap();
        store.save_update(&update, &raw).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_keeps_order() {
        let store = MemoryUpdatesStore::new(10);
        assert!(store.is_empty().await);

        save(&store, 1).await;
        save(&store, 2).await;

        let ids: Vec<i64> = store.snapshot().await.iter().map(|u| u.update_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(store.latest().await.unwrap().raw, json!({ "update_id": 2 }));
    }

    #[tokio::test]
    async fn test_store_evicts_oldest() {
        let store = MemoryUpdatesStore::new(2);
        for id in 1..=5 {
            save(&store, id).await;
        }

        let ids: Vec<i64> = store.snapshot().await.iter().map(|u| u.update_id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_keeps_one() {
        let store = MemoryUpdatesStore::new(0);
        save(&store, 1).await;
        save(&store, 2).await;
        assert_eq!(store.latest().await.unwrap().update_id, 2);
        assert_eq!(store.len().await, 1);
    }
}
