pub mod collections;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use crate::types::{ActivityRecord, Notification, RecordId, StatRecord, Stored};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;

/// Stable collection names. Each maps to one SQLite table.
pub const COLLECTION_STATS: &str = "website_stats";
pub const COLLECTION_NOTIFICATIONS: &str = "notifications";
pub const COLLECTION_ACTIVITY: &str = "admin_activity";
pub const COLLECTION_USERS: &str = "admin_users";

pub const ALL_COLLECTIONS: [&str; 4] = [
    COLLECTION_STATS,
    COLLECTION_NOTIFICATIONS,
    COLLECTION_ACTIVITY,
    COLLECTION_USERS,
];

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("pool error: {0}")]
    Pool(#[from] deadpool_sqlite::PoolError),

    #[error("interact error: {0}")]
    Interact(#[from] deadpool_sqlite::InteractError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Count filters over the stats collection. Time bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsFilter {
    Visits {
        page: String,
        since: Option<DateTime<Local>>,
        until: Option<DateTime<Local>>,
    },
    DownloadAttempts,
    SuccessfulDownloads,
}

impl StatsFilter {
    pub fn visits(page: &str) -> Self {
        StatsFilter::Visits {
            page: page.to_string(),
            since: None,
            until: None,
        }
    }

    pub fn visits_between(
        page: &str,
        since: Option<DateTime<Local>>,
        until: Option<DateTime<Local>>,
    ) -> Self {
        StatsFilter::Visits {
            page: page.to_string(),
            since,
            until,
        }
    }

    /// Apply the filter to a single record.
    pub fn matches(&self, record: &StatRecord) -> bool {
        use crate::types::StatKind;
        match self {
            StatsFilter::Visits { page, since, until } => {
                if record.page() != Some(page.as_str()) {
                    return false;
                }
                let ts = record.timestamp();
                since.map_or(true, |s| ts >= s) && until.map_or(true, |u| ts <= u)
            }
            StatsFilter::DownloadAttempts => record.kind() == StatKind::Download,
            StatsFilter::SuccessfulDownloads => record.kind() == StatKind::SuccessfulDownload,
        }
    }
}

/// Visit and download events. Append-only.
#[async_trait]
pub trait StatsCollection: Send + Sync + 'static {
    async fn insert(&self, record: StatRecord) -> StoreResult<RecordId>;

    async fn count(&self, filter: &StatsFilter) -> StoreResult<u64>;

    /// Round-trip to the backing store.
    async fn ping(&self) -> StoreResult<()>;
}

/// Broadcast notifications. Only the `active` flag is ever updated.
#[async_trait]
pub trait NotificationCollection: Send + Sync + 'static {
    async fn insert(&self, notification: Notification) -> StoreResult<RecordId>;

    /// Most recent notification with `active = true`.
    async fn find_active(&self) -> StoreResult<Option<Stored<Notification>>>;

    /// Set `active = false` on every active notification. Returns how many changed.
    async fn deactivate_all(&self) -> StoreResult<u64>;
}

/// Admin audit log. Append-only.
#[async_trait]
pub trait ActivityCollection: Send + Sync + 'static {
    async fn insert(&self, record: ActivityRecord) -> StoreResult<RecordId>;

    /// Newest first, at most `limit` entries.
    async fn find_recent(&self, limit: usize) -> StoreResult<Vec<Stored<ActivityRecord>>>;
}

/// Handles to every collection the handlers use. Cheap to clone.
///
/// There are three handles for the four names in [`ALL_COLLECTIONS`].
/// `admin_users` is created with the schema but has no handle: the admin
/// account comes from configuration and no handler reads or writes users.
#[derive(Clone)]
pub struct Gateway {
    pub stats: Arc<dyn StatsCollection>,
    pub notifications: Arc<dyn NotificationCollection>,
    pub activity: Arc<dyn ActivityCollection>,
}

impl Gateway {
    /// Collections backed by an initialized SQLite pool.
    pub fn sqlite(pool: deadpool_sqlite::Pool) -> Self {
        Self {
            stats: Arc::new(collections::SqliteStats::new(pool.clone())),
            notifications: Arc::new(collections::SqliteNotifications::new(pool.clone())),
            activity: Arc::new(collections::SqliteActivity::new(pool)),
        }
    }

    /// Collections held in process memory.
    pub fn in_memory() -> Self {
        Self {
            stats: Arc::new(memory::MemoryStats::default()),
            notifications: Arc::new(memory::MemoryNotifications::default()),
            activity: Arc::new(memory::MemoryActivity::default()),
        }
    }
}
