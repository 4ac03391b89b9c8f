//! Types shared by the object storage backends.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;

/// Streamed object body contents.
pub type ObjectStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// One stored object as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Object key, `/`-separated (e.g. "calibnet/diff/height_100.car.zst")
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Store-level SHA-256 checksum, if the backend records one
    pub sha256: Option<Vec<u8>>,
    /// Store-level upload timestamp, if the backend records one
    pub uploaded: Option<DateTime<Utc>>,
}

/// One page of a listing.
///
/// `truncated == true` means more pages exist and `cursor` resumes the
/// listing strictly after the last returned key.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub entries: Vec<ObjectEntry>,
    pub truncated: bool,
    pub cursor: Option<String>,
}

/// An inclusive byte range within an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Inclusive ranges always cover at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A streamed object body plus the number of bytes it will yield.
pub struct ObjectBody {
    /// Bytes the stream will produce (the range length for partial reads)
    pub length: u64,
    /// The body bytes
    pub stream: ObjectStream,
}
