//! In-memory object store.
//!
//! Backs tests and ephemeral runs with a DashMap. Checksum and upload
//! timestamp are settable per object, so any archive scenario can be staged
//! without touching the disk.

use super::backend::ObjectStore;
use super::types::{ByteRange, ListPage, ObjectBody, ObjectEntry, ObjectStream};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Object stored in the memory backend.
#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    sha256: Option<Vec<u8>>,
    uploaded: Option<DateTime<Utc>>,
}

/// In-memory object store using DashMap.
///
/// All data is lost when the process exits. Listing order is lexicographic
/// over a snapshot of the keys, matching the filesystem store.
///
/// # Thread Safety
///
/// `MemoryStore` is `Clone` and uses `DashMap` internally for lock-free
/// concurrent access. Clones share the same objects, so a test can keep a
/// handle for seeding after handing the store to a bucket.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<DashMap<String, StoredObject>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object with an upload timestamp of now and no checksum.
    pub fn put(&self, key: &str, data: impl Into<Bytes>) {
        self.put_full(key, data, None, Some(Utc::now()));
    }

    /// Stores an object with explicit checksum and upload timestamp.
    pub fn put_full(
        &self,
        key: &str,
        data: impl Into<Bytes>,
        sha256: Option<Vec<u8>>,
        uploaded: Option<DateTime<Utc>>,
    ) {
        self.objects.insert(
            key.to_string(),
            StoredObject {
                data: data.into(),
                sha256,
                uploaded,
            },
        );
    }

    /// Returns the number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

fn entry_for(key: &str, object: &StoredObject) -> ObjectEntry {
    ObjectEntry {
        key: key.to_string(),
        size: object.data.len() as u64,
        sha256: object.sha256.clone(),
        uploaded: object.uploaded,
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str, limit: usize, cursor: Option<&str>) -> Result<ListPage> {
        let mut all: Vec<ObjectEntry> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry_for(entry.key(), entry.value()))
            .collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));

        let start = match cursor {
            Some(cursor) => all.partition_point(|entry| entry.key.as_str() <= cursor),
            None => 0,
        };

        let truncated = all.len() - start > limit;
        let entries: Vec<ObjectEntry> = all.into_iter().skip(start).take(limit).collect();
        let cursor = if truncated {
            entries.last().map(|entry| entry.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            entries,
            truncated,
            cursor,
        })
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectEntry>> {
        Ok(self
            .objects
            .get(key)
            .map(|entry| entry_for(entry.key(), entry.value())))
    }

    async fn get(&self, key: &str, range: Option<ByteRange>) -> Result<Option<ObjectBody>> {
        let Some(object) = self.objects.get(key).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };

        let total = object.data.len() as u64;
        let chunk = match range {
            Some(range) => {
                let start = range.start.min(total) as usize;
                let end = range.end.saturating_add(1).min(total) as usize;
                object.data.slice(start..end)
            },
            None => object.data,
        };

        let length = chunk.len() as u64;
        let stream: ObjectStream = Box::pin(futures::stream::iter(std::iter::once(Ok(chunk))));

        Ok(Some(ObjectBody { length, stream }))
    }
}
