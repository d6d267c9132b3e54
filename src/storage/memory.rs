//! In-process collections with the same query semantics as the SQLite ones.

use super::{
    ActivityCollection, NotificationCollection, StatsCollection, StatsFilter, StoreResult,
};
use crate::types::{ActivityRecord, Notification, RecordId, StatRecord, Stored};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Append-only list that hands out increasing ids, like an autoincrement key.
struct Rows<T> {
    next_id: i64,
    rows: Vec<Stored<T>>,
}

impl<T> Default for Rows<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<T> Rows<T> {
    fn push(&mut self, record: T) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.rows.push(Stored { id, record });
        id
    }
}

#[derive(Default)]
pub struct MemoryStats {
    inner: RwLock<Rows<StatRecord>>,
}

#[async_trait]
impl StatsCollection for MemoryStats {
    async fn insert(&self, record: StatRecord) -> StoreResult<RecordId> {
        Ok(self.inner.write().await.push(record))
    }

    async fn count(&self, filter: &StatsFilter) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.rows.iter().filter(|s| filter.matches(&s.record)).count() as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNotifications {
    inner: RwLock<Rows<Notification>>,
}

#[async_trait]
impl NotificationCollection for MemoryNotifications {
    async fn insert(&self, notification: Notification) -> StoreResult<RecordId> {
        Ok(self.inner.write().await.push(notification))
    }

    async fn find_active(&self) -> StoreResult<Option<Stored<Notification>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .filter(|s| s.record.active)
            .max_by_key(|s| (s.record.timestamp, s.id))
            .cloned())
    }

    async fn deactivate_all(&self) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let mut changed = 0;
        for stored in inner.rows.iter_mut().filter(|s| s.record.active) {
            stored.record.active = false;
            changed += 1;
        }
        Ok(changed)
    }
}

#[derive(Default)]
pub struct MemoryActivity {
    inner: RwLock<Rows<ActivityRecord>>,
}

#[async_trait]
impl ActivityCollection for MemoryActivity {
    async fn insert(&self, record: ActivityRecord) -> StoreResult<RecordId> {
        Ok(self.inner.write().await.push(record))
    }

    async fn find_recent(&self, limit: usize) -> StoreResult<Vec<Stored<ActivityRecord>>> {
        let inner = self.inner.read().await;
        let mut rows: Vec<_> = inner.rows.clone();
        rows.sort_by(|a, b| {
            b.record
                .timestamp
                .cmp(&a.record.timestamp)
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}
