use crate::auth::credentials::{token_is_valid, AdminCredentials, ADMIN_TOKEN};
use crate::client::ClientInfo;
use crate::error::{payload, AppError, AppResult, LoggedJson, PayloadRejection, StoreContext};
use crate::storage::Gateway;
use crate::types::{ActivityRecord, LoginRequest, LoginResponse, StatusResponse, VerifyRequest};
use axum::extract::State;
use axum::Json;
use chrono::Local;
use std::sync::Arc;

/// Shared state for the login and verify routes.
pub struct AuthState {
    pub gateway: Gateway,
    pub credentials: AdminCredentials,
}

/// POST /api/admin/login - Check the static admin account and hand out the token.
pub async fn login(
    State(state): State<Arc<AuthState>>,
    client: ClientInfo,
    body: Result<LoggedJson<LoginRequest>, PayloadRejection>,
) -> AppResult<Json<LoginResponse>> {
    const FAILED: &str = "Login failed";
    let req = payload(body, FAILED)?;
    let username = req.username.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    tracing::info!(username = %username, "login attempt");

    if !state.credentials.verify(&username, &password) {
        tracing::warn!(username = %username, "failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!(username = %username, "successful login");
    let record = ActivityRecord {
        action: "Admin Login".to_string(),
        details: Some(format!("Successful login for {username}")),
        timestamp: Local::now(),
        ip_address: client.ip_address,
    };
    state.gateway.activity.insert(record).await.context(FAILED)?;

    Ok(Json(LoginResponse {
        status: "success",
        message: "Login successful",
        token: ADMIN_TOKEN,
    }))
}

/// POST /api/admin/verify - Accept only the admin token.
pub async fn verify(
    body: Result<LoggedJson<VerifyRequest>, PayloadRejection>,
) -> AppResult<Json<StatusResponse>> {
    let req = payload(body, "Verification failed")?;
    tracing::debug!("verifying admin token");

    if token_is_valid(req.token.as_deref()) {
        tracing::debug!("admin token verified");
        Ok(Json(StatusResponse::success()))
    } else {
        tracing::warn!("invalid admin token");
        Err(AppError::InvalidToken)
    }
}
