//! Filesystem-backed object store.
//!
//! Maps object keys onto a directory tree. Listing scans the tree and sorts
//! keys lexicographically; the cursor is "strictly after this key", so a
//! scan can resume across pages even while files come and go.

use super::backend::ObjectStore;
use super::types::{ByteRange, ListPage, ObjectBody, ObjectEntry, ObjectStream};
use crate::security;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Read granularity for streamed bodies.
const CHUNK_SIZE: usize = 64 * 1024;

/// Object store backed by a local directory.
///
/// Keys are relative `/`-separated paths under the base directory. The
/// filesystem records no checksums, so `sha256` is always `None`; `uploaded`
/// is the file modification time.
///
/// # Thread Safety
///
/// `FilesystemStore` is `Clone` and can be shared across threads. Blocking
/// filesystem work runs on the blocking thread pool.
#[derive(Clone)]
pub struct FilesystemStore {
    base_dir: PathBuf,
}

impl FilesystemStore {
    /// Creates or opens a store rooted at the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_dir).with_context(|| {
            format!("Failed to create archive directory: {}", base_dir.display())
        })?;

        Ok(Self { base_dir })
    }

    /// Resolves a key to an on-disk path, rejecting traversal attempts.
    fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = security::sanitize_key(key)?;
        security::resolve_within(&self.base_dir, &relative)
    }

    /// Collects every entry under `prefix`, sorted by key.
    fn collect_entries_sync(&self, prefix: &str) -> Result<Vec<ObjectEntry>> {
        let mut entries = Vec::new();
        scan_into(&self.base_dir, &self.base_dir, prefix, &mut entries)?;
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    fn list_sync(&self, prefix: &str, limit: usize, cursor: Option<&str>) -> Result<ListPage> {
        let all = self.collect_entries_sync(prefix)?;

        // Entries are sorted, so the cursor position is a partition point.
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

    fn head_sync(&self, key: &str) -> Result<Option<ObjectEntry>> {
        let path = self.object_path(key)?;

        let metadata = match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to stat object: {key}"));
            },
        };

        Ok(Some(ObjectEntry {
            key: key.to_string(),
            size: metadata.len(),
            sha256: None,
            uploaded: metadata.modified().ok().map(DateTime::<Utc>::from),
        }))
    }
}

/// Recursively walks `dir`, pushing file entries whose key matches `prefix`.
fn scan_into(base: &Path, dir: &Path, prefix: &str, out: &mut Vec<ObjectEntry>) -> Result<()> {
    let reader = fs::read_dir(dir)
        .with_context(|| format!("Failed to read archive directory: {}", dir.display()))?;

    for entry in reader {
        let entry = entry.with_context(|| format!("Failed to read entry in: {}", dir.display()))?;
        let path = entry.path();
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed to stat: {}", path.display()))?;

        if metadata.is_dir() {
            scan_into(base, &path, prefix, out)?;
        } else if metadata.is_file() {
            let Ok(relative) = path.strip_prefix(base) else {
                continue;
            };
            let key = relative.to_string_lossy().replace('\\', "/");
            if !key.starts_with(prefix) {
                continue;
            }

            out.push(ObjectEntry {
                key,
                size: metadata.len(),
                sha256: None,
                uploaded: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
    }

    Ok(())
}

/// Streams `remaining` bytes from an open file in fixed-size chunks.
fn file_stream(file: tokio::fs::File, remaining: u64) -> ObjectStream {
    Box::pin(futures::stream::try_unfold(
        (file, remaining),
        |(mut file, remaining)| async move {
            if remaining == 0 {
                return Ok(None);
            }

            let capacity = CHUNK_SIZE.min(usize::try_from(remaining).unwrap_or(CHUNK_SIZE));
            let mut buf = vec![0u8; capacity];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                return Ok(None);
            }

            buf.truncate(read);
            Ok(Some((Bytes::from(buf), (file, remaining - read as u64))))
        },
    ))
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn list(&self, prefix: &str, limit: usize, cursor: Option<&str>) -> Result<ListPage> {
        let store = self.clone();
        let prefix = prefix.to_string();
        let cursor = cursor.map(std::string::ToString::to_string);
        tokio::task::spawn_blocking(move || store.list_sync(&prefix, limit, cursor.as_deref()))
            .await
            .context("Task join error")?
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectEntry>> {
        let store = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || store.head_sync(&key))
            .await
            .context("Task join error")?
    }

    async fn get(&self, key: &str, range: Option<ByteRange>) -> Result<Option<ObjectBody>> {
        let path = self.object_path(key)?;

        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to open object: {key}"));
            },
        };

        let metadata = file
            .metadata()
            .await
            .with_context(|| format!("Failed to stat object: {key}"))?;
        if !metadata.is_file() {
            return Ok(None);
        }

        let total = metadata.len();
        let length = match range {
            Some(range) => {
                file.seek(SeekFrom::Start(range.start))
                    .await
                    .with_context(|| format!("Failed to seek in object: {key}"))?;
                total.saturating_sub(range.start).min(range.len())
            },
            None => total,
        };

        Ok(Some(ObjectBody {
            length,
            stream: file_stream(file, length),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::TempDir;

    fn store_with_files(files: &[(&str, &[u8])]) -> (TempDir, FilesystemStore) {
        let dir = TempDir::new().unwrap();
        for (key, data) in files {
            let path = dir.path().join(key);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, data).unwrap();
        }
        let store = FilesystemStore::open(dir.path()).unwrap();
        (dir, store)
    }

    async fn read_all(body: ObjectBody) -> Vec<u8> {
        let chunks: Vec<Bytes> = body.stream.try_collect().await.unwrap();
        chunks.concat()
    }

    #[tokio::test]
    async fn test_list_sorted_with_prefix() {
        let (_dir, store) = store_with_files(&[
            ("calibnet/diff/height_200.car.zst", b"a"),
            ("calibnet/diff/height_100.car.zst", b"b"),
            ("mainnet/diff/height_300.car.zst", b"c"),
        ]);

        let page = store.list("calibnet/", 500, None).await.unwrap();
        assert!(!page.truncated);
        assert_eq!(
            page.entries.iter().map(|e| e.key.as_str()).collect::<Vec<_>>(),
            vec![
                "calibnet/diff/height_100.car.zst",
                "calibnet/diff/height_200.car.zst",
            ]
        );
        assert!(page.entries.iter().all(|e| e.sha256.is_none()));
        assert!(page.entries.iter().all(|e| e.uploaded.is_some()));
    }

    #[tokio::test]
    async fn test_list_cursor_pagination_is_complete() {
        let files: Vec<(String, Vec<u8>)> = (0..7)
            .map(|n| (format!("a/height_{n}.car.zst"), vec![b'x']))
            .collect();
        let refs: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(k, d)| (k.as_str(), d.as_slice()))
            .collect();
        let (_dir, store) = store_with_files(&refs);

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = store.list("a/", 3, cursor.as_deref()).await.unwrap();
            seen.extend(page.entries.iter().map(|e| e.key.clone()));
            if !page.truncated {
                break;
            }
            cursor = page.cursor;
            assert!(cursor.is_some());
        }

        assert_eq!(seen.len(), 7);
        let mut sorted = seen.clone();
        sorted.sort();
        assert_eq!(seen, sorted);
    }

    #[tokio::test]
    async fn test_head_found_and_missing() {
        let (_dir, store) = store_with_files(&[("a/height_1.car.zst", b"hello")]);

        let entry = store.head("a/height_1.car.zst").await.unwrap().unwrap();
        assert_eq!(entry.size, 5);
        assert!(entry.sha256.is_none());

        assert!(store.head("a/missing.car.zst").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_full_body() {
        let (_dir, store) = store_with_files(&[("a/height_1.car.zst", b"snapshot bytes")]);

        let body = store.get("a/height_1.car.zst", None).await.unwrap().unwrap();
        assert_eq!(body.length, 14);
        assert_eq!(read_all(body).await, b"snapshot bytes");
    }

    #[tokio::test]
    async fn test_get_range() {
        let (_dir, store) = store_with_files(&[("a/height_1.car.zst", b"0123456789")]);

        let range = ByteRange { start: 2, end: 5 };
        let body = store
            .get("a/height_1.car.zst", Some(range))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body.length, 4);
        assert_eq!(read_all(body).await, b"2345");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_dir, store) = store_with_files(&[]);
        assert!(store.get("nope.car.zst", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_traversal_key_is_rejected() {
        let (_dir, store) = store_with_files(&[]);

        assert!(store.get("../outside.txt", None).await.is_err());
        assert!(store.head("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_directory_key_is_not_an_object() {
        let (_dir, store) = store_with_files(&[("a/b/height_1.car.zst", b"x")]);
        assert!(store.head("a/b").await.unwrap().is_none());
    }
}
