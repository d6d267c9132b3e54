use crate::storage::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Request failures. `context` is the fixed message the client sees; the
/// underlying cause is only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("{context}: {detail}")]
    Payload {
        context: &'static str,
        detail: String,
    },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Store { context, source } => {
                tracing::error!(error = %source, "{context}");
                error_body(context)
            }
            AppError::Payload { context, detail } => {
                tracing::error!(error = %detail, "{context}");
                error_body(context)
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({ "status": "error", "message": "Invalid credentials" })),
            )
                .into_response(),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({ "status": "error" })),
            )
                .into_response(),
        }
    }
}

fn error_body(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({ "error": message })),
    )
        .into_response()
}

pub type AppResult<T> = Result<T, AppError>;

/// Attach an endpoint's public failure message to a store result.
pub trait StoreContext<T> {
    fn context(self, context: &'static str) -> AppResult<T>;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn context(self, context: &'static str) -> AppResult<T> {
        self.map_err(|source| AppError::Store { context, source })
    }
}

/// JSON extractor that logs deserialization errors before returning them.
/// Handlers take `Result<LoggedJson<T>, PayloadRejection>` so each endpoint
/// can answer with its own failure message.
pub struct LoggedJson<T>(pub T);

#[derive(Debug)]
pub struct PayloadRejection(pub String);

impl PayloadRejection {
    pub fn context(self, context: &'static str) -> AppError {
        AppError::Payload {
            context,
            detail: self.0,
        }
    }
}

impl IntoResponse for PayloadRejection {
    fn into_response(self) -> Response {
        self.context("invalid request body").into_response()
    }
}

impl<S, T> FromRequest<S> for LoggedJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = PayloadRejection;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(LoggedJson(value)),
            Err(rejection) => {
                tracing::warn!(
                    path = %path,
                    error = %rejection,
                    "JSON parse error (client sent malformed payload)"
                );
                Err(PayloadRejection(rejection.body_text()))
            }
        }
    }
}

/// Unwrap a `LoggedJson` extraction, mapping a rejection to the endpoint's message.
pub fn payload<T>(
    extracted: Result<LoggedJson<T>, PayloadRejection>,
    context: &'static str,
) -> AppResult<T> {
    extracted
        .map(|LoggedJson(value)| value)
        .map_err(|rejection| rejection.context(context))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_store_error_hides_cause() {
        let err: AppResult<()> =
            Err(StoreError::Database(rusqlite::Error::InvalidQuery)).context("Failed to get stats");
        let response = err.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Failed to get stats" }));
    }

    #[tokio::test]
    async fn test_auth_errors_are_generic_401s() {
        let response = AppError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "error", "message": "Invalid credentials" })
        );

        let response = AppError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await, json!({ "status": "error" }));
    }

    #[tokio::test]
    async fn test_payload_rejection_uses_endpoint_message() {
        let err = payload::<()>(
            Err(PayloadRejection("expected value".to_string())),
            "Failed to track visit",
        )
        .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Failed to track visit" })
        );
    }
}
