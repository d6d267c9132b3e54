use crate::client::ClientInfo;
use crate::error::{payload, AppResult, LoggedJson, PayloadRejection, StoreContext};
use crate::storage::Gateway;
use crate::types::{
    DownloadRecord, StatRecord, StatusResponse, TrackDownloadRequest, TrackVisitRequest,
    VisitRecord,
};
use axum::extract::State;
use axum::Json;
use chrono::Local;

const URL_LOG_CHARS: usize = 100;

/// POST /api/track-visit - Record a page view.
pub async fn track_visit(
    State(gateway): State<Gateway>,
    client: ClientInfo,
    body: Result<LoggedJson<TrackVisitRequest>, PayloadRejection>,
) -> AppResult<Json<StatusResponse>> {
    const FAILED: &str = "Failed to track visit";
    let req = payload(body, FAILED)?;

    tracing::info!(page = ?req.page, "tracking visit");

    let record = StatRecord::Visit(VisitRecord {
        page: req.page,
        timestamp: Local::now(),
        ip_address: client.ip_address,
        user_agent: client.user_agent,
    });

    let id = gateway.stats.insert(record).await.context(FAILED)?;
    tracing::info!(%id, "visit tracked");

    Ok(Json(StatusResponse::success()))
}

/// POST /api/track-download - Record a download attempt. The URL is optional.
pub async fn track_download(
    State(gateway): State<Gateway>,
    client: ClientInfo,
    body: Result<LoggedJson<TrackDownloadRequest>, PayloadRejection>,
) -> AppResult<Json<StatusResponse>> {
    const FAILED: &str = "Failed to track download";
    let req = payload(body, FAILED)?;

    let url_preview: String = req
        .url
        .as_deref()
        .unwrap_or("Unknown")
        .chars()
        .take(URL_LOG_CHARS)
        .collect();
    tracing::info!(url = %url_preview, "tracking download attempt");

    let record = StatRecord::Download(DownloadRecord::Attempted {
        url: req.url,
        timestamp: Local::now(),
        ip_address: client.ip_address,
    });

    let id = gateway.stats.insert(record).await.context(FAILED)?;
    tracing::info!(%id, "download attempt tracked");

    Ok(Json(StatusResponse::success()))
}

/// POST /api/track-successful-download - Record a completed download.
/// The body must be JSON but its content is ignored.
pub async fn track_successful_download(
    State(gateway): State<Gateway>,
    client: ClientInfo,
    body: Result<LoggedJson<serde_json::Value>, PayloadRejection>,
) -> AppResult<Json<StatusResponse>> {
    const FAILED: &str = "Failed to track successful download";
    payload(body, FAILED)?;
    tracing::info!("tracking successful download");

    let record = StatRecord::Download(DownloadRecord::Succeeded {
        timestamp: Local::now(),
        ip_address: client.ip_address,
    });

    let id = gateway.stats.insert(record).await.context(FAILED)?;
    tracing::info!(%id, "successful download tracked");

    Ok(Json(StatusResponse::success()))
}
