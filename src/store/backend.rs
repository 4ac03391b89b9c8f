//! Backend trait for object storage.
//!
//! Defines the interface that all storage backends implement, so the listing
//! engine and the HTTP layer never care which backend is behind a bucket.

use super::types::{ByteRange, ListPage, ObjectBody, ObjectEntry};
use anyhow::Result;
use async_trait::async_trait;

/// Cursor-paginated object storage.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
/// Keys are opaque `/`-separated strings; listing returns them in a stable
/// backend-defined order so a cursor can resume an interrupted scan.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Lists up to `limit` objects whose key starts with `prefix`.
    ///
    /// # Arguments
    /// * `prefix` - Key prefix filter (may be empty to list everything)
    /// * `limit` - Maximum entries per page; callers stay at or below 500
    /// * `cursor` - Resume strictly after this key, from a previous page
    ///
    /// # Returns
    /// A page of entries. When `truncated` is set, `cursor` carries the
    /// position for the next call.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn list(&self, prefix: &str, limit: usize, cursor: Option<&str>) -> Result<ListPage>;

    /// Retrieves object metadata without downloading the body.
    ///
    /// # Returns
    /// * `Ok(Some(entry))` - Object found
    /// * `Ok(None)` - Object not found
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or metadata cannot be read.
    async fn head(&self, key: &str) -> Result<Option<ObjectEntry>>;

    /// Opens an object body for streaming, optionally restricted to a range.
    ///
    /// Callers validate ranges against `head` before asking; a range that
    /// reaches past the object is clamped, never an error.
    ///
    /// # Returns
    /// * `Ok(Some(body))` - Object found, body ready to stream
    /// * `Ok(None)` - Object not found
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the object cannot be opened.
    async fn get(&self, key: &str, range: Option<ByteRange>) -> Result<Option<ObjectBody>>;
}
