use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use wallet_core::domain::error::CoreError;

/// Wraps `CoreError` so a handler can just return `Result<_, ApiError>` and
/// rely on `?`; the status code mapping below is the whole of spec §7's
/// error taxonomy translated to HTTP.
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CoreError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            CoreError::InsufficientFunds { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string())
            }
            CoreError::IdempotencyConflict(_) => (StatusCode::CONFLICT, self.0.to_string()),
            CoreError::Transient(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "the request may be retried".to_string(),
            ),
            CoreError::Internal(_) => {
                tracing::error!(error = %self.0, "internal error serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": message,
        }));

        (status, body).into_response()
    }
}
