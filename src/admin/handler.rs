use crate::admin::stats;
use crate::client::ClientInfo;
use crate::error::{payload, AppResult, LoggedJson, PayloadRejection, StoreContext};
use crate::storage::Gateway;
use crate::types::{ActivityRecord, ActivityView, StatsResponse, StatusResponse, TrackActivityRequest};
use axum::extract::State;
use axum::Json;
use chrono::Local;

/// How many audit entries the dashboard shows.
pub const RECENT_ACTIVITY_LIMIT: usize = 20;

/// GET /api/admin/stats - Visit and download figures, recomputed on every call.
pub async fn get_stats(State(gateway): State<Gateway>) -> AppResult<Json<StatsResponse>> {
    tracing::info!("generating admin statistics");
    let result = stats::compute(gateway.stats.as_ref(), Local::now())
        .await
        .context("Failed to get stats")?;
    tracing::info!(
        total_visits = result.total_visits,
        today_visits = result.today_visits,
        "admin stats generated"
    );
    Ok(Json(result))
}

/// GET /api/admin/activity - The most recent audit entries, newest first.
pub async fn recent_activity(State(gateway): State<Gateway>) -> Json<Vec<ActivityView>> {
    match gateway.activity.find_recent(RECENT_ACTIVITY_LIMIT).await {
        Ok(rows) => {
            tracing::info!(count = rows.len(), "retrieved recent activities");
            Json(rows.into_iter().map(ActivityView::from).collect())
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch activities");
            Json(Vec::new())
        }
    }
}

/// POST /api/admin/track-activity - Append an entry to the audit log.
pub async fn track_activity(
    State(gateway): State<Gateway>,
    client: ClientInfo,
    body: Result<LoggedJson<TrackActivityRequest>, PayloadRejection>,
) -> AppResult<Json<StatusResponse>> {
    const FAILED: &str = "Failed to track activity";
    let req = payload(body, FAILED)?;
    tracing::info!(
        action = %req.action,
        details = %req.details.as_deref().unwrap_or("No details"),
        "tracking admin activity"
    );

    let record = ActivityRecord {
        action: req.action,
        details: req.details,
        timestamp: Local::now(),
        ip_address: client.ip_address,
    };

    let id = gateway.activity.insert(record).await.context(FAILED)?;
    tracing::debug!(%id, "admin activity tracked");

    Ok(Json(StatusResponse::success()))
}
