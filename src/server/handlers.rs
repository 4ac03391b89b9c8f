//! HTTP handlers for the gateway routes.
//!
//! Every route is GET (axum answers HEAD from GET handlers). Handlers
//! return `Result<_, AppError>` and let store failures bubble up as 500s;
//! empty listings and unknown names are 404s, never errors.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use super::error::AppError;
use super::pages::{self, PageContext};
use super::range::{self, ParsedRange};
use super::{AppState, metrics};
use crate::listing::{self, ListingQuery};
use crate::security;
use crate::store::{BucketName, ObjectBody};

/// Default listing page size.
const DEFAULT_LIMIT: usize = 20;

/// Largest page a client may request.
const MAX_LIMIT: usize = 100;

/// Query parameters accepted by listing pages.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct ListingParams {
    search: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl ListingParams {
    /// Clamps user-supplied paging values: `limit` to `[1, 100]` with a
    /// default of 20, `offset` to `>= 0`.
    fn clamp(&self) -> (usize, usize) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let limit = self
            .limit
            .unwrap_or(DEFAULT_LIMIT as i64)
            .clamp(1, MAX_LIMIT as i64) as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let offset = self.offset.unwrap_or(0).max(0) as usize;
        (limit, offset)
    }

    fn search(&self) -> Option<&str> {
        self.search.as_deref().filter(|query| !query.is_empty())
    }
}

/// GET / and /list - archive home page.
pub(crate) async fn home() -> Html<String> {
    Html(pages::render_home_page())
}

/// GET /list/{chain}/{kind} - paginated, searchable listing page.
pub(crate) async fn listing_page(
    State(state): State<AppState>,
    Path((chain, kind)): Path<(String, String)>,
    Query(params): Query<ListingParams>,
) -> Result<Html<String>, AppError> {
    let (bucket_name, prefix, title) = resolve_listing(&chain, &kind)
        .ok_or_else(|| AppError::NotFound(format!("No such listing: {chain}/{kind}")))?;
    metrics::record_listing_request(bucket_name.as_str());

    let (limit, offset) = params.clamp();
    let query = ListingQuery {
        prefix,
        search: params.search().map(str::to_string),
        limit: Some(limit),
        offset,
        latest_only: false,
    };

    let bucket = state.buckets.get(bucket_name);
    let result = listing::list_bucket(bucket, &query).await?;

    let ctx = PageContext {
        title: &title,
        bucket: bucket_name,
        search: params.search(),
        limit,
        offset,
    };
    Ok(Html(pages::render_listing_page(&ctx, &result)))
}

/// Maps a `/list/{chain}/{kind}` pair onto a bucket, prefix and title.
///
/// The mapping is closed: unknown chains or kinds are a 404, not a
/// fallback.
fn resolve_listing(chain: &str, kind: &str) -> Option<(BucketName, String, String)> {
    let display = match chain {
        "calibnet" => "Calibnet",
        "mainnet" => "Mainnet",
        _ => return None,
    };

    let (bucket, title) = match kind {
        "latest-v2" => (
            BucketName::SnapshotV2,
            format!("{display} Latest Snapshots (F3) (last 14 days)"),
        ),
        "latest-v1" => (
            BucketName::SnapshotV2,
            format!("{display} Legacy Snapshots (last 14 days)"),
        ),
        "diff" => (BucketName::Forest, format!("{display} Diff Snapshots Archive")),
        "lite" => (BucketName::Forest, format!("{display} Lite Snapshots Archive")),
        _ => return None,
    };

    Some((bucket, format!("{chain}/{kind}/"), title))
}

/// GET /archive/{bucket}/{*key} - byte-range-capable download proxy.
pub(crate) async fn archive(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let name = BucketName::parse(&bucket)
        .ok_or_else(|| AppError::NotFound(format!("Unknown bucket: {bucket}")))?;
    security::sanitize_key(&key).map_err(|err| AppError::BadRequest(err.to_string()))?;

    let bucket = state.buckets.get(name);
    let entry = bucket
        .head(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Object not found: {key}")))?;

    let requested = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| range::parse_range(value, entry.size));

    let byte_range = match requested {
        Some(ParsedRange::Satisfiable(range)) => Some(range),
        Some(ParsedRange::Unsatisfiable) => {
            return Err(AppError::RangeNotSatisfiable { total: entry.size });
        },
        None => None,
    };

    let body = bucket
        .get(&key, byte_range)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Object not found: {key}")))?;
    metrics::record_object_served(body.length);
    debug!(bucket = %name, key = %key, bytes = body.length, partial = byte_range.is_some(), "serving object");

    let mut response = Response::builder()
        .status(if byte_range.is_some() {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        })
        .header(header::CONTENT_TYPE, content_type_for_key(&key))
        .header(header::CONTENT_LENGTH, body.length)
        .header(header::ACCEPT_RANGES, "bytes");

    if let Some(range) = byte_range {
        response = response.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", range.start, range.end, entry.size),
        );
    }

    response
        .body(Body::from_stream(body.stream))
        .map_err(|err| AppError::Internal(err.into()))
}

/// GET /latest/{chain} - latest validated snapshot from the snapshot bucket.
pub(crate) async fn latest(
    State(state): State<AppState>,
    Path(chain): Path<String>,
) -> Result<Response, AppError> {
    serve_latest(&state, BucketName::Snapshot, format!("{chain}/latest/")).await
}

/// GET /latest-v1/{chain} - latest validated legacy snapshot.
pub(crate) async fn latest_v1(
    State(state): State<AppState>,
    Path(chain): Path<String>,
) -> Result<Response, AppError> {
    serve_latest(&state, BucketName::SnapshotV2, format!("{chain}/latest-v1/")).await
}

/// GET /latest-v2/{chain} - latest validated F3 snapshot.
pub(crate) async fn latest_v2(
    State(state): State<AppState>,
    Path(chain): Path<String>,
) -> Result<Response, AppError> {
    serve_latest(&state, BucketName::SnapshotV2, format!("{chain}/latest-v2/")).await
}

/// Streams the latest validated snapshot under a prefix as an attachment.
///
/// An empty eligible set is a clean 404; an unknown chain simply yields an
/// empty enumeration and lands in the same branch.
async fn serve_latest(
    state: &AppState,
    name: BucketName,
    prefix: String,
) -> Result<Response, AppError> {
    metrics::record_latest_request(name.as_str());

    let bucket = state.buckets.get(name);
    let query = ListingQuery {
        prefix,
        latest_only: true,
        ..Default::default()
    };
    let result = listing::list_bucket(bucket, &query).await?;

    let Some(snapshot) = result.objects.first() else {
        return Err(AppError::NotFound(
            "No validated snapshot available".to_string(),
        ));
    };

    let ObjectBody { length, stream } = bucket
        .get(&snapshot.key, None)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Object not found: {}", snapshot.key)))?;
    metrics::record_object_served(length);

    let filename = snapshot.key.rsplit('/').next().unwrap_or(&snapshot.key);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for_key(&snapshot.key))
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|err| AppError::Internal(err.into()))
}

/// GET /health - liveness probe.
pub(crate) async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// GET /metrics - Prometheus text exposition.
pub(crate) async fn metrics_text(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics recorder is not installed".to_string(),
        )
            .into_response(),
    }
}

/// Fallback for known paths hit with a method other than GET/HEAD.
pub(crate) async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, HEAD")],
        "Method not allowed".to_string(),
    )
}

/// Content type for an object key. Snapshot payloads are zstd frames;
/// sidecars and metadata are text formats.
fn content_type_for_key(key: &str) -> &'static str {
    if key.ends_with(".zst") {
        "application/zstd"
    } else if key.ends_with(".sha256sum") || key.ends_with(".txt") {
        "text/plain; charset=utf-8"
    } else if key.ends_with(".json") {
        "application/json; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}
