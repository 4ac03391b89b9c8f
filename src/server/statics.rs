//! Static asset serving under `/static`.
//!
//! Assets come from the configured on-disk directory. Paths go through the
//! same traversal checks as object keys before anything is read.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::borrow::Cow;
use tracing::warn;

use super::AppState;
use super::error::AppError;
use crate::security;

/// Cache-Control header value for static assets (1 hour).
const STATIC_CACHE_CONTROL: &str = "public, max-age=3600";

/// GET /static/{*path} - serve an on-disk asset.
pub(crate) async fn serve_static(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let relative = security::sanitize_key(&path).map_err(|err| {
        warn!("rejected static path {path:?}: {err}");
        AppError::BadRequest("Invalid path".to_string())
    })?;

    let full_path =
        security::resolve_within(&state.static_dir, &relative).map_err(|err| {
            warn!("rejected static path {path:?}: {err}");
            AppError::BadRequest("Invalid path".to_string())
        })?;

    match tokio::fs::read(&full_path).await {
        Ok(contents) => Ok((
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    guess_content_type(&full_path).into_owned(),
                ),
                (header::CACHE_CONTROL, STATIC_CACHE_CONTROL.to_string()),
            ],
            contents,
        )
            .into_response()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound("File not found".to_string()))
        },
        Err(err) => Err(AppError::Internal(anyhow::Error::new(err).context(format!(
            "Failed to read static file: {}",
            full_path.display()
        )))),
    }
}

/// Guess a content type from the file extension using `mime_guess`, adding
/// a charset for text formats.
fn guess_content_type(path: &std::path::Path) -> Cow<'static, str> {
    mime_guess::from_path(path)
        .first()
        .map_or(Cow::Borrowed("application/octet-stream"), |mime| {
            let mime_str = mime.essence_str();
            match mime_str {
                "text/html" => Cow::Borrowed("text/html; charset=utf-8"),
                "text/css" => Cow::Borrowed("text/css; charset=utf-8"),
                "text/javascript" | "application/javascript" => {
                    Cow::Borrowed("text/javascript; charset=utf-8")
                },
                "application/json" => Cow::Borrowed("application/json; charset=utf-8"),
                "image/png" => Cow::Borrowed("image/png"),
                "image/svg+xml" => Cow::Borrowed("image/svg+xml"),
                "image/x-icon" => Cow::Borrowed("image/x-icon"),
                _ => {
                    if mime_str.starts_with("text/") {
                        Cow::Owned(format!("{mime_str}; charset=utf-8"))
                    } else {
                        Cow::Owned(mime_str.to_string())
                    }
                },
            }
        })
}
