use crate::storage::Gateway;
use crate::types::HealthResponse;
use axum::extract::State;
use axum::Json;
use chrono::Local;

/// GET /api/health - Always 200; `database` reflects a live ping.
pub async fn health(State(gateway): State<Gateway>) -> Json<HealthResponse> {
    tracing::debug!("health check requested");
    let db_ok = match gateway.stats.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "database ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: "healthy",
        timestamp: Local::now(),
        database: if db_ok { "connected" } else { "disconnected" },
    })
}
