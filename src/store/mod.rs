//! Object storage behind the gateway.
//!
//! Three logical buckets hold the snapshot archives. Each bucket wraps an
//! [`ObjectStore`] backend behind a cheap `Clone` facade, so the listing
//! engine and the HTTP handlers never care whether the bytes come from a
//! local directory or an in-memory store.

pub mod backend;
pub mod filesystem;
pub mod memory;
pub mod types;

pub use backend::ObjectStore;
pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;
pub use types::{ByteRange, ListPage, ObjectBody, ObjectEntry, ObjectStream};

use crate::config::BucketsConfig;
use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The closed set of archive buckets the gateway serves.
///
/// Bucket names appear in URLs and in configuration; parsing an unknown name
/// is a lookup failure, never a fallback to some default bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketName {
    /// Diff and lite snapshots produced by Forest
    Forest,
    /// Full snapshots, including the `latest/` pointers
    Snapshot,
    /// Second-generation snapshots (F3-aware), `latest-v1/` and `latest-v2/`
    SnapshotV2,
}

impl BucketName {
    /// Every bucket, in configuration order.
    pub const ALL: [BucketName; 3] = [Self::Forest, Self::Snapshot, Self::SnapshotV2];

    /// Canonical wire name as it appears in URLs and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forest => "forest",
            Self::Snapshot => "snapshot",
            Self::SnapshotV2 => "snapshot-v2",
        }
    }

    /// Parses a wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "forest" => Some(Self::Forest),
            "snapshot" => Some(Self::Snapshot),
            "snapshot-v2" => Some(Self::SnapshotV2),
            _ => None,
        }
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named handle on one archive bucket.
///
/// # Thread Safety
///
/// `Bucket` is `Clone` and can be shared across threads. The underlying
/// backend handles concurrent access safely.
#[derive(Clone)]
pub struct Bucket {
    name: BucketName,
    store: Arc<dyn ObjectStore>,
}

impl Bucket {
    /// Creates a bucket backed by a local directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn filesystem<P: AsRef<Path>>(name: BucketName, base_dir: P) -> Result<Self> {
        let store = FilesystemStore::open(base_dir)
            .with_context(|| format!("Failed to open bucket: {name}"))?;
        Ok(Self {
            name,
            store: Arc::new(store),
        })
    }

    /// Creates a bucket with a custom backend.
    pub fn custom<S: ObjectStore>(name: BucketName, store: S) -> Self {
        Self {
            name,
            store: Arc::new(store),
        }
    }

    /// The bucket's wire name.
    pub fn name(&self) -> BucketName {
        self.name
    }

    /// Lists up to `limit` objects under `prefix`, resuming after `cursor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn list(&self, prefix: &str, limit: usize, cursor: Option<&str>) -> Result<ListPage> {
        self.store.list(prefix, limit, cursor).await
    }

    /// Retrieves object metadata without downloading the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn head(&self, key: &str) -> Result<Option<ObjectEntry>> {
        self.store.head(key).await
    }

    /// Opens an object body for streaming, optionally restricted to a range.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn get(&self, key: &str, range: Option<ByteRange>) -> Result<Option<ObjectBody>> {
        self.store.get(key, range).await
    }
}

/// The resolved table of all archive buckets, built once at startup.
#[derive(Clone)]
pub struct Buckets {
    forest: Bucket,
    snapshot: Bucket,
    snapshot_v2: Bucket,
}

impl Buckets {
    /// Builds the table from explicit bucket handles.
    pub fn new(forest: Bucket, snapshot: Bucket, snapshot_v2: Bucket) -> Self {
        Self {
            forest,
            snapshot,
            snapshot_v2,
        }
    }

    /// Opens all buckets on the local filesystem per the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any bucket directory cannot be created.
    pub fn open(config: &BucketsConfig) -> Result<Self> {
        Ok(Self {
            forest: Bucket::filesystem(BucketName::Forest, &config.forest)?,
            snapshot: Bucket::filesystem(BucketName::Snapshot, &config.snapshot)?,
            snapshot_v2: Bucket::filesystem(BucketName::SnapshotV2, &config.snapshot_v2)?,
        })
    }

    /// Looks up a bucket by name. Total over [`BucketName`].
    pub fn get(&self, name: BucketName) -> &Bucket {
        match name {
            BucketName::Forest => &self.forest,
            BucketName::Snapshot => &self.snapshot,
            BucketName::SnapshotV2 => &self.snapshot_v2,
        }
    }
}
