//! HTTP error type for the gateway handlers.
//!
//! Handlers return `Result<_, AppError>` and use `?` on store calls; the
//! `IntoResponse` impl maps each variant to a status code. Internal errors
//! are logged with their full chain and surface as an opaque 500.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Gateway errors with their HTTP mapping.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Resource does not exist: unknown page, unknown bucket, missing key,
    /// or no validated snapshot to serve.
    #[error("not found: {0}")]
    NotFound(String),

    /// The client sent something unusable (bad key, bad path).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A syntactically valid `Range` header that no byte of the object can
    /// satisfy. Carries the object length for the `Content-Range` header.
    #[error("range not satisfiable for object of {total} bytes")]
    RangeNotSatisfiable { total: u64 },

    /// Anything unexpected, usually a failed store operation.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::RangeNotSatisfiable { total } => (
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(header::CONTENT_RANGE, format!("bytes */{total}"))],
                String::new(),
            )
                .into_response(),
            Self::Internal(err) => {
                error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
                    .into_response()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = AppError::NotFound("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::BadRequest("x".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_range_not_satisfiable_carries_content_range() {
        let resp = AppError::RangeNotSatisfiable { total: 100 }.into_response();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            resp.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */100"
        );
    }
}
