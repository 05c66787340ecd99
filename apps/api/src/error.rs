use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use opsdesk_core::AppError;
use serde::Serialize;
use tracing::error;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
    /// Machine-readable refusal reason, present on 403 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    reason: Option<String>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self.0 {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, None),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            AppError::Conflict(_) => (StatusCode::CONFLICT, None),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, None),
            AppError::Forbidden(reason) => (StatusCode::FORBIDDEN, Some(reason.clone())),
            AppError::Internal(detail) => {
                error!(%detail, "request failed with internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let message = match &self.0 {
            AppError::Internal(_) => "internal error".to_owned(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { message, reason })).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use opsdesk_core::AppError;

    use super::ApiError;

    async fn body_of(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = ApiError(error).into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|error| panic!("body: {error}"));
        let body = serde_json::from_slice(&bytes).unwrap_or_else(|error| panic!("json: {error}"));
        (status, body)
    }

    #[tokio::test]
    async fn forbidden_carries_reason() {
        let (status, body) = body_of(AppError::Forbidden("self".to_owned())).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "self");
        assert_eq!(body["message"], "forbidden: self");
    }

    #[tokio::test]
    async fn internal_detail_is_not_exposed() {
        let (status, body) = body_of(AppError::Internal("pool timed out".to_owned())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "internal error");
        assert!(body.get("reason").is_none());
    }
}
