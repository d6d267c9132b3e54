use crate::error::{payload, AppError, AppResult, LoggedJson, PayloadRejection, StoreContext};
use crate::storage::Gateway;
use crate::types::{Notification, NotificationView, SendNotificationRequest, StatusResponse};
use axum::extract::State;
use axum::Json;
use chrono::Local;

const SENT_BY: &str = "admin";

/// Shorten a message for log output.
fn preview(message: &str, max_chars: usize) -> String {
    if message.chars().count() > max_chars {
        let head: String = message.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}

/// GET /api/notifications - The latest active notification as a one-element list.
/// Absence, and store failures, both yield an empty list.
pub async fn list_active(State(gateway): State<Gateway>) -> Json<Vec<NotificationView>> {
    match gateway.notifications.find_active().await {
        Ok(Some(stored)) => {
            tracing::info!(
                id = %stored.id,
                message = %preview(&stored.record.message, 50),
                "sending active notification"
            );
            Json(vec![NotificationView::from(stored.record)])
        }
        Ok(None) => {
            tracing::debug!("no active notifications");
            Json(Vec::new())
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch notifications");
            Json(Vec::new())
        }
    }
}

/// POST /api/admin/notification - Replace the active notification.
///
/// Deactivation and insert are two separate writes. A reader in between sees no
/// active notification, and two concurrent publishers can leave two active rows;
/// the read path then shows the most recent one.
///
/// A body without `message` is only rejected after the deactivation write, so
/// it leaves no notification active.
pub async fn publish(
    State(gateway): State<Gateway>,
    body: Result<LoggedJson<SendNotificationRequest>, PayloadRejection>,
) -> AppResult<Json<StatusResponse>> {
    const FAILED: &str = "Failed to send notification";
    let req = payload(body, FAILED)?;
    tracing::info!(
        message = %preview(req.message.as_deref().unwrap_or(""), 100),
        "preparing notification"
    );

    let deactivated = gateway
        .notifications
        .deactivate_all()
        .await
        .context(FAILED)?;
    tracing::debug!(deactivated, "deactivated previous notifications");

    let message = req.message.ok_or_else(|| AppError::Payload {
        context: FAILED,
        detail: "missing field `message`".to_string(),
    })?;

    let notification = Notification {
        message,
        action_text: req.action_text,
        action_url: req.action_url,
        timestamp: Local::now(),
        active: true,
        sent_by: SENT_BY.to_string(),
    };

    let id = gateway
        .notifications
        .insert(notification)
        .await
        .context(FAILED)?;
    tracing::info!(%id, "notification sent");

    Ok(Json(StatusResponse::success()))
}
