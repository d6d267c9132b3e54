use crate::storage::{StatsCollection, StatsFilter, StoreResult};
use crate::types::{StatsResponse, VisitSeries};
use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Visits to this page are what the dashboard counts.
pub const COUNTED_PAGE: &str = "user";

/// Length of the daily visit chart, ending today.
pub const CHART_DAYS: u64 = 7;

/// Resolve a wall-clock time in the server's zone. Across a DST fold the
/// earlier (or later) instant is taken; inside a gap the time is read as UTC.
fn local_instant(naive: NaiveDateTime, earliest: bool) -> DateTime<Local> {
    let mapped = Local.from_local_datetime(&naive);
    let resolved = if earliest {
        mapped.earliest()
    } else {
        mapped.latest()
    };
    resolved.unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// Inclusive `[00:00:00.000, 23:59:59.999]` bounds of a local calendar day.
pub fn day_window(date: NaiveDate) -> (DateTime<Local>, DateTime<Local>) {
    let start = local_instant(date.and_time(NaiveTime::MIN), true);
    let last_ms = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    let end = local_instant(date.and_time(last_ms), false);
    (start, end)
}

/// Build the dashboard statistics as of `now`.
///
/// Every figure is its own count query: four totals followed by one query per
/// chart day. The first failing query aborts the whole computation.
pub async fn compute(
    stats: &dyn StatsCollection,
    now: DateTime<Local>,
) -> StoreResult<StatsResponse> {
    let today = now.date_naive();

    let total_visits = stats.count(&StatsFilter::visits(COUNTED_PAGE)).await?;
    tracing::debug!(total_visits, "counted total visits");

    let (today_start, _) = day_window(today);
    let today_visits = stats
        .count(&StatsFilter::visits_between(
            COUNTED_PAGE,
            Some(today_start),
            None,
        ))
        .await?;
    tracing::debug!(today_visits, "counted today's visits");

    let total_downloads = stats.count(&StatsFilter::DownloadAttempts).await?;
    tracing::debug!(total_downloads, "counted download attempts");

    let successful_downloads = stats.count(&StatsFilter::SuccessfulDownloads).await?;
    tracing::debug!(successful_downloads, "counted successful downloads");

    let mut labels = Vec::with_capacity(CHART_DAYS as usize);
    let mut data = Vec::with_capacity(CHART_DAYS as usize);
    for back in (0..CHART_DAYS).rev() {
        let date = today.checked_sub_days(Days::new(back)).unwrap_or(today);
        let (start, end) = day_window(date);
        let count = stats
            .count(&StatsFilter::visits_between(
                COUNTED_PAGE,
                Some(start),
                Some(end),
            ))
            .await?;
        let label = date.format("%m/%d").to_string();
        tracing::debug!(day = %label, visits = count, "counted daily visits");
        labels.push(label);
        data.push(count);
    }

    Ok(StatsResponse {
        total_visits,
        today_visits,
        total_downloads,
        successful_downloads,
        visits_data: VisitSeries { labels, data },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStats;
    use crate::types::{DownloadRecord, StatRecord, VisitRecord};
    use chrono::Duration;

    fn noon(date: NaiveDate) -> DateTime<Local> {
        local_instant(date.and_hms_opt(12, 0, 0).unwrap(), true)
    }

    fn visit(page: &str, timestamp: DateTime<Local>) -> StatRecord {
        StatRecord::Visit(VisitRecord {
            page: Some(page.to_string()),
            timestamp,
            ip_address: "127.0.0.1".to_string(),
            user_agent: "Unknown".to_string(),
        })
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_window_is_inclusive_full_day() {
        let (start, end) = day_window(date(2024, 3, 15));
        assert_eq!(start.date_naive(), date(2024, 3, 15));
        assert_eq!(end.date_naive(), date(2024, 3, 15));
        assert_eq!(start.time(), NaiveTime::MIN);
        assert_eq!(end.format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
    }

    #[tokio::test]
    async fn test_empty_collection_yields_zeroes() {
        let stats = MemoryStats::default();
        let now = noon(date(2024, 3, 15));
        let result = compute(&stats, now).await.unwrap();

        assert_eq!(result.total_visits, 0);
        assert_eq!(result.today_visits, 0);
        assert_eq!(result.visits_data.data, vec![0; 7]);
        assert_eq!(
            result.visits_data.labels,
            vec!["03/09", "03/10", "03/11", "03/12", "03/13", "03/14", "03/15"]
        );
    }

    #[tokio::test]
    async fn test_totals_and_weekly_series_from_seeded_records() {
        let stats = MemoryStats::default();
        let today = date(2024, 3, 15);
        let now = noon(today);

        // Visits per day going back: today=3, 1 day ago=1, 6 days ago=2, 7 and 30 days ago fall outside.
        let seeds: [(u64, usize); 5] = [(0, 3), (1, 1), (6, 2), (7, 4), (30, 5)];
        for (back, n) in seeds {
            let day = today.checked_sub_days(Days::new(back)).unwrap();
            for _ in 0..n {
                stats.insert(visit("user", noon(day))).await.unwrap();
            }
        }
        // Other pages never count.
        stats.insert(visit("admin", now)).await.unwrap();

        for _ in 0..4 {
            stats
                .insert(StatRecord::Download(DownloadRecord::Attempted {
                    url: Some("https://example.com/v".to_string()),
                    timestamp: now,
                    ip_address: "127.0.0.1".to_string(),
                }))
                .await
                .unwrap();
        }
        stats
            .insert(StatRecord::Download(DownloadRecord::Attempted {
                url: None,
                timestamp: now,
                ip_address: "127.0.0.1".to_string(),
            }))
            .await
            .unwrap();
        for _ in 0..2 {
            stats
                .insert(StatRecord::Download(DownloadRecord::Succeeded {
                    timestamp: now,
                    ip_address: "127.0.0.1".to_string(),
                }))
                .await
                .unwrap();
        }

        let result = compute(&stats, now).await.unwrap();
        assert_eq!(result.total_visits, 15);
        assert_eq!(result.today_visits, 3);
        assert_eq!(result.total_downloads, 5);
        assert_eq!(result.successful_downloads, 2);
        assert_eq!(result.visits_data.data, vec![2, 0, 0, 0, 0, 1, 3]);
        assert_eq!(result.visits_data.data.iter().sum::<u64>(), 6);
        assert_eq!(result.visits_data.labels.first().unwrap(), "03/09");
        assert_eq!(result.visits_data.labels.last().unwrap(), "03/15");
    }

    #[tokio::test]
    async fn test_today_counts_everything_since_midnight() {
        let stats = MemoryStats::default();
        let today = date(2024, 3, 15);
        let (start, end) = day_window(today);

        stats.insert(visit("user", start)).await.unwrap();
        stats.insert(visit("user", end)).await.unwrap();
        stats
            .insert(visit("user", start - Duration::milliseconds(1)))
            .await
            .unwrap();

        let result = compute(&stats, noon(today)).await.unwrap();
        assert_eq!(result.today_visits, 2);
        assert_eq!(result.visits_data.data[6], 2);
        assert_eq!(result.visits_data.data[5], 1);
    }
}
