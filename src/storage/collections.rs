use super::{
    ActivityCollection, NotificationCollection, StatsCollection, StatsFilter, StoreResult,
};
use crate::types::{
    ActivityRecord, DownloadRecord, Notification, RecordId, StatRecord, Stored,
};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use deadpool_sqlite::Pool;
use rusqlite::{params, Connection};

/// Run `f` on a pooled connection.
async fn with_conn<T, F>(pool: &Pool, f: F) -> StoreResult<T>
where
    F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let conn = pool.get().await?;
    let value = conn.interact(f).await??;
    Ok(value)
}

fn to_millis(ts: &DateTime<Local>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Local> {
    DateTime::from_timestamp_millis(ms)
        .unwrap_or_default()
        .with_timezone(&Local)
}

pub struct SqliteStats {
    pool: Pool,
}

impl SqliteStats {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsCollection for SqliteStats {
    async fn insert(&self, record: StatRecord) -> StoreResult<RecordId> {
        with_conn(&self.pool, move |conn| {
            let kind = record.kind();
            match &record {
                StatRecord::Visit(v) => conn.execute(
                    "INSERT INTO website_stats (kind, page, ip_address, user_agent, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        kind.as_str(),
                        v.page,
                        v.ip_address,
                        v.user_agent,
                        to_millis(&v.timestamp)
                    ],
                )?,
                StatRecord::Download(d) => {
                    let (url, timestamp, ip_address) = match d {
                        DownloadRecord::Attempted {
                            url,
                            timestamp,
                            ip_address,
                        } => (url.as_deref(), timestamp, ip_address),
                        DownloadRecord::Succeeded {
                            timestamp,
                            ip_address,
                        } => (None, timestamp, ip_address),
                    };
                    conn.execute(
                        "INSERT INTO website_stats (kind, url, status, ip_address, timestamp)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![
                            kind.as_str(),
                            url,
                            d.status(),
                            ip_address,
                            to_millis(timestamp)
                        ],
                    )?
                }
            };
            Ok(RecordId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn count(&self, filter: &StatsFilter) -> StoreResult<u64> {
        let filter = filter.clone();
        with_conn(&self.pool, move |conn| {
            let count: i64 = match filter {
                StatsFilter::Visits { page, since, until } => {
                    let since = since.as_ref().map(to_millis).unwrap_or(i64::MIN);
                    let until = until.as_ref().map(to_millis).unwrap_or(i64::MAX);
                    conn.query_row(
                        "SELECT COUNT(*) FROM website_stats
                         WHERE kind = 'visit' AND page = ?1 AND timestamp >= ?2 AND timestamp <= ?3",
                        params![page, since, until],
                        |row| row.get(0),
                    )?
                }
                StatsFilter::DownloadAttempts => conn.query_row(
                    "SELECT COUNT(*) FROM website_stats WHERE kind = 'download'",
                    [],
                    |row| row.get(0),
                )?,
                StatsFilter::SuccessfulDownloads => conn.query_row(
                    "SELECT COUNT(*) FROM website_stats WHERE kind = 'successful_download'",
                    [],
                    |row| row.get(0),
                )?,
            };
            Ok(count.max(0) as u64)
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        with_conn(&self.pool, |conn| conn.execute_batch("SELECT 1")).await
    }
}

pub struct SqliteNotifications {
    pool: Pool,
}

impl SqliteNotifications {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationCollection for SqliteNotifications {
    async fn insert(&self, notification: Notification) -> StoreResult<RecordId> {
        with_conn(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO notifications (message, action_text, action_url, timestamp, active, sent_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    notification.message,
                    notification.action_text,
                    notification.action_url,
                    to_millis(&notification.timestamp),
                    notification.active,
                    notification.sent_by,
                ],
            )?;
            Ok(RecordId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn find_active(&self) -> StoreResult<Option<Stored<Notification>>> {
        with_conn(&self.pool, |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, message, action_text, action_url, timestamp, active, sent_by
                 FROM notifications
                 WHERE active = 1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT 1",
            )?;
            let mut rows = stmt.query_map([], |row| {
                Ok(Stored {
                    id: RecordId(row.get(0)?),
                    record: Notification {
                        message: row.get(1)?,
                        action_text: row.get(2)?,
                        action_url: row.get(3)?,
                        timestamp: from_millis(row.get(4)?),
                        active: row.get(5)?,
                        sent_by: row.get(6)?,
                    },
                })
            })?;
            let found = rows.next().transpose()?;
            Ok(found)
        })
        .await
    }

    async fn deactivate_all(&self) -> StoreResult<u64> {
        with_conn(&self.pool, |conn| {
            let changed = conn.execute("UPDATE notifications SET active = 0 WHERE active = 1", [])?;
            Ok(changed as u64)
        })
        .await
    }
}

pub struct SqliteActivity {
    pool: Pool,
}

impl SqliteActivity {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityCollection for SqliteActivity {
    async fn insert(&self, record: ActivityRecord) -> StoreResult<RecordId> {
        with_conn(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO admin_activity (action, details, timestamp, ip_address)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.action,
                    record.details,
                    to_millis(&record.timestamp),
                    record.ip_address,
                ],
            )?;
            Ok(RecordId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn find_recent(&self, limit: usize) -> StoreResult<Vec<Stored<ActivityRecord>>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        with_conn(&self.pool, move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, action, details, timestamp, ip_address
                 FROM admin_activity
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit], |row| {
                    Ok(Stored {
                        id: RecordId(row.get(0)?),
                        record: ActivityRecord {
                            action: row.get(1)?,
                            details: row.get(2)?,
                            timestamp: from_millis(row.get(3)?),
                            ip_address: row.get(4)?,
                        },
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
    }
}
