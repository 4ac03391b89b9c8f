//! The listing engine: enumerate, sort, select, paginate.
//!
//! Object storage enumerates keys in its own cursor-paginated order, which
//! has nothing to do with snapshot heights. The engine therefore always
//! collects the complete matching set first, sorts it by descending height,
//! and only then slices a page or picks the latest validated snapshot.
//! Stopping the scan early once a page is full would only be correct if the
//! store's native order already matched height order, which nothing
//! guarantees. The cost is O(matching keys / 500) store round-trips per
//! request; prefixes top out at tens of thousands of keys, which is fine.
//!
//! Each request runs an independent computation over the store's current
//! state. Nothing is cached and nothing is retried here; store failures
//! propagate to the HTTP layer unchanged.

mod height;

pub use height::snapshot_height;

use crate::store::Bucket;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Suffix of snapshot payload objects.
pub const SNAPSHOT_SUFFIX: &str = ".car.zst";

/// Suffix appended to a snapshot key by the validation pipeline.
pub const SIDECAR_SUFFIX: &str = ".sha256sum";

/// Page size used against the store. Stores cap list calls at 500 entries.
const LIST_PAGE_SIZE: usize = 500;

/// Engine-level view of one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Object key, unique within its bucket
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Lowercase hex SHA-256, empty when the store has no checksum
    pub checksum: String,
    /// Upload time, falling back to the enumeration time when the store
    /// has no timestamp
    pub uploaded: DateTime<Utc>,
}

/// One listing request, immutable per call.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    /// Key prefix to enumerate
    pub prefix: String,
    /// Case-insensitive substring filter on the key
    pub search: Option<String>,
    /// Page size; `None` disables pagination and returns everything
    pub limit: Option<usize>,
    /// Items to skip from the top of the sorted set
    pub offset: usize,
    /// Select the single latest validated snapshot instead of paginating
    pub latest_only: bool,
}

/// The outcome of a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Records in descending height order
    pub objects: Vec<ObjectRecord>,
    /// Matching records before any pagination window was applied
    pub total_count: usize,
    /// Whether records exist past the returned window
    pub has_more: bool,
}

/// Runs one listing request against a bucket.
///
/// Enumerates everything under the prefix (filtered by search), sorts by
/// descending height, then either selects the latest validated snapshot or
/// slices the requested page.
///
/// # Errors
///
/// Returns an error when a store list call fails; partial results are never
/// returned.
pub async fn list_bucket(bucket: &Bucket, query: &ListingQuery) -> Result<Listing> {
    let records = collect_matching(bucket, &query.prefix, query.search.as_deref()).await?;

    let mut records = records;
    sort_by_height_desc(&mut records);

    let listing = if query.latest_only {
        select_latest(records)
    } else {
        paginate(records, query.offset, query.limit)
    };

    debug!(
        bucket = %bucket.name(),
        prefix = %query.prefix,
        total = listing.total_count,
        returned = listing.objects.len(),
        has_more = listing.has_more,
        "listing complete"
    );

    Ok(listing)
}

/// Exhaustively enumerates every object under `prefix` whose key contains
/// `search` case-insensitively (all objects when `search` is `None`).
///
/// Pages through the store sequentially: each cursor comes from the
/// previous response, so the calls cannot be fanned out. Entry order is
/// whatever the store returns.
///
/// # Errors
///
/// Returns an error when any page fetch fails.
pub async fn collect_matching(
    bucket: &Bucket,
    prefix: &str,
    search: Option<&str>,
) -> Result<Vec<ObjectRecord>> {
    let needle = search.map(str::to_lowercase);
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = bucket.list(prefix, LIST_PAGE_SIZE, cursor.as_deref()).await?;
        pages += 1;
        metrics::counter!("carport_store_list_pages_total").increment(1);

        for entry in page.entries {
            if let Some(needle) = &needle
                && !entry.key.to_lowercase().contains(needle)
            {
                continue;
            }

            records.push(ObjectRecord {
                key: entry.key,
                size: entry.size,
                checksum: entry.sha256.map(hex::encode).unwrap_or_default(),
                uploaded: entry.uploaded.unwrap_or_else(Utc::now),
            });
        }

        if !page.truncated {
            break;
        }
        cursor = page.cursor;
    }

    debug!(
        prefix = %prefix,
        pages,
        matched = records.len(),
        "enumeration complete"
    );

    Ok(records)
}

/// Stable sort by descending snapshot height.
///
/// Keys without a parseable height sort as height 0, after every real
/// snapshot; ties keep the store's enumeration order.
pub fn sort_by_height_desc(records: &mut [ObjectRecord]) {
    records.sort_by_key(|record| std::cmp::Reverse(snapshot_height(&record.key)));
}

/// Picks the latest validated snapshot from a height-sorted set.
///
/// A snapshot is eligible when its key ends in `.car.zst` and the same
/// enumeration also contains its `.sha256sum` sidecar; an unvalidated
/// snapshot never wins, whatever its height. `total_count` reports all
/// eligible records, not the single returned one, and `has_more` is always
/// false.
pub fn select_latest(records: Vec<ObjectRecord>) -> Listing {
    let keys: HashSet<&str> = records.iter().map(|record| record.key.as_str()).collect();

    let mut eligible = records
        .iter()
        .filter(|record| {
            record.key.ends_with(SNAPSHOT_SUFFIX)
                && keys.contains(format!("{}{SIDECAR_SUFFIX}", record.key).as_str())
        })
        .cloned()
        .collect::<Vec<_>>();

    let total_count = eligible.len();
    eligible.truncate(1);

    Listing {
        objects: eligible,
        total_count,
        has_more: false,
    }
}

/// Slices the window `[offset, offset+limit)` out of a height-sorted set.
///
/// `total_count` is the full set size. An offset past the end yields an
/// empty page, not an error; `limit == None` returns everything. The caller
/// clamps user-supplied values, not this function.
pub fn paginate(records: Vec<ObjectRecord>, offset: usize, limit: Option<usize>) -> Listing {
    let total_count = records.len();

    let (objects, has_more) = match limit {
        Some(limit) => {
            let objects: Vec<ObjectRecord> =
                records.into_iter().skip(offset).take(limit).collect();
            (objects, offset + limit < total_count)
        },
        None => (records, false),
    };

    Listing {
        objects,
        total_count,
        has_more,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Bucket, BucketName, MemoryStore};
    use chrono::TimeZone;

    fn record(key: &str) -> ObjectRecord {
        ObjectRecord {
            key: key.to_string(),
            size: 1,
            checksum: String::new(),
            uploaded: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn keys(listing: &Listing) -> Vec<&str> {
        listing
            .objects
            .iter()
            .map(|record| record.key.as_str())
            .collect()
    }

    fn memory_bucket(store: MemoryStore) -> Bucket {
        Bucket::custom(BucketName::Forest, store)
    }

    #[test]
    fn test_sort_is_height_descending_and_stable() {
        let mut records = vec![
            record("a/height_100.car.zst"),
            record("a/notes.txt"),
            record("a/height_300.car.zst"),
            record("a/other.txt"),
            record("a/height_200.car.zst"),
        ];
        sort_by_height_desc(&mut records);

        assert_eq!(
            records.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
            vec![
                "a/height_300.car.zst",
                "a/height_200.car.zst",
                "a/height_100.car.zst",
                // height-0 records keep their relative order at the tail
                "a/notes.txt",
                "a/other.txt",
            ]
        );
    }

    #[test]
    fn test_select_latest_requires_sidecar() {
        let mut records = vec![
            record("a/height_100.car.zst"),
            record("a/height_100.car.zst.sha256sum"),
            record("a/height_90.car.zst"),
        ];
        sort_by_height_desc(&mut records);

        let listing = select_latest(records);
        assert_eq!(keys(&listing), vec!["a/height_100.car.zst"]);
        assert_eq!(listing.total_count, 1);
        assert!(!listing.has_more);
    }

    #[test]
    fn test_select_latest_skips_unvalidated_higher_snapshot() {
        let mut records = vec![
            record("a/height_200.car.zst"),
            record("a/height_100.car.zst"),
            record("a/height_100.car.zst.sha256sum"),
        ];
        sort_by_height_desc(&mut records);

        let listing = select_latest(records);
        assert_eq!(keys(&listing), vec!["a/height_100.car.zst"]);
    }

    #[test]
    fn test_select_latest_counts_all_eligible() {
        let mut records = vec![
            record("a/height_100.car.zst"),
            record("a/height_100.car.zst.sha256sum"),
            record("a/height_200.car.zst"),
            record("a/height_200.car.zst.sha256sum"),
        ];
        sort_by_height_desc(&mut records);

        let listing = select_latest(records);
        assert_eq!(keys(&listing), vec!["a/height_200.car.zst"]);
        assert_eq!(listing.total_count, 2);
    }

    #[test]
    fn test_select_latest_empty_when_nothing_validated() {
        let records = vec![record("a/height_100.car.zst"), record("a/height_90.car.zst")];
        let listing = select_latest(records);
        assert!(listing.objects.is_empty());
        assert_eq!(listing.total_count, 0);
    }

    #[test]
    fn test_select_latest_ignores_bare_sidecars() {
        // A sidecar without its payload must not become "latest".
        let records = vec![record("a/height_100.car.zst.sha256sum")];
        let listing = select_latest(records);
        assert!(listing.objects.is_empty());
    }

    #[test]
    fn test_paginate_middle_window() {
        let records: Vec<ObjectRecord> = (0..10)
            .map(|n| record(&format!("a/height_{}.car.zst", 100 - n)))
            .collect();

        let listing = paginate(records, 3, Some(4));
        assert_eq!(listing.objects.len(), 4);
        assert_eq!(listing.objects[0].key, "a/height_97.car.zst");
        assert_eq!(listing.total_count, 10);
        assert!(listing.has_more);
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let records: Vec<ObjectRecord> = (0..55)
            .map(|n| record(&format!("a/height_{n}.car.zst")))
            .collect();

        let listing = paginate(records, 40, Some(20));
        assert_eq!(listing.objects.len(), 15);
        assert_eq!(listing.total_count, 55);
        assert!(!listing.has_more);
    }

    #[test]
    fn test_paginate_offset_past_end() {
        let records: Vec<ObjectRecord> = (0..30)
            .map(|n| record(&format!("a/height_{n}.car.zst")))
            .collect();

        let listing = paginate(records, 100, Some(20));
        assert!(listing.objects.is_empty());
        assert_eq!(listing.total_count, 30);
        assert!(!listing.has_more);
    }

    #[test]
    fn test_paginate_no_limit_returns_everything() {
        let records: Vec<ObjectRecord> = (0..7)
            .map(|n| record(&format!("a/height_{n}.car.zst")))
            .collect();

        let listing = paginate(records, 0, None);
        assert_eq!(listing.objects.len(), 7);
        assert!(!listing.has_more);
    }

    #[test]
    fn test_paginate_exact_boundary_has_no_more() {
        let records: Vec<ObjectRecord> = (0..40)
            .map(|n| record(&format!("a/height_{n}.car.zst")))
            .collect();

        let listing = paginate(records, 20, Some(20));
        assert_eq!(listing.objects.len(), 20);
        assert!(!listing.has_more);
    }

    #[test]
    fn test_paginate_empty_set() {
        let listing = paginate(Vec::new(), 0, Some(20));
        assert!(listing.objects.is_empty());
        assert_eq!(listing.total_count, 0);
        assert!(!listing.has_more);
    }

    #[tokio::test]
    async fn test_collect_matching_exhausts_all_pages() {
        let store = MemoryStore::new();
        // Three store pages worth of objects.
        for n in 0..1201 {
            store.put(&format!("a/height_{n:05}.car.zst"), &b"x"[..]);
        }
        let bucket = memory_bucket(store);

        let records = collect_matching(&bucket, "a/", None).await.unwrap();
        assert_eq!(records.len(), 1201);
    }

    #[tokio::test]
    async fn test_collect_matching_search_is_case_insensitive() {
        let store = MemoryStore::new();
        store.put("a/Mainnet_height_1.car.zst", &b"x"[..]);
        store.put("a/calibnet_height_2.car.zst", &b"x"[..]);
        let bucket = memory_bucket(store);

        let records = collect_matching(&bucket, "a/", Some("MAINNET")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "a/Mainnet_height_1.car.zst");
    }

    #[tokio::test]
    async fn test_collect_matching_maps_checksum_to_hex() {
        let store = MemoryStore::new();
        store.put_full("a/height_1.car.zst", &b"x"[..], Some(vec![0xde, 0xad]), None);
        store.put("a/height_2.car.zst", &b"x"[..]);
        let bucket = memory_bucket(store);

        let records = collect_matching(&bucket, "a/", None).await.unwrap();
        assert_eq!(records[0].checksum, "dead");
        assert_eq!(records[1].checksum, "");
        // No store timestamp defaults to the enumeration time.
        assert!(records[0].uploaded <= Utc::now());
    }

    #[tokio::test]
    async fn test_list_bucket_paginated_end_to_end() {
        let store = MemoryStore::new();
        for n in 1..=25 {
            store.put(&format!("a/height_{n:03}.car.zst"), &b"x"[..]);
        }
        let bucket = memory_bucket(store);

        let query = ListingQuery {
            prefix: "a/".to_string(),
            limit: Some(10),
            offset: 0,
            ..Default::default()
        };
        let listing = list_bucket(&bucket, &query).await.unwrap();

        assert_eq!(listing.objects.len(), 10);
        assert_eq!(listing.objects[0].key, "a/height_025.car.zst");
        assert_eq!(listing.total_count, 25);
        assert!(listing.has_more);
    }

    #[tokio::test]
    async fn test_list_bucket_latest_end_to_end() {
        let store = MemoryStore::new();
        store.put("a/height_100.car.zst", &b"x"[..]);
        store.put("a/height_100.car.zst.sha256sum", &b"x"[..]);
        store.put("a/height_90.car.zst", &b"x"[..]);
        let bucket = memory_bucket(store);

        let query = ListingQuery {
            prefix: "a/".to_string(),
            latest_only: true,
            ..Default::default()
        };
        let listing = list_bucket(&bucket, &query).await.unwrap();

        assert_eq!(keys(&listing), vec!["a/height_100.car.zst"]);
    }

    #[tokio::test]
    async fn test_list_bucket_is_deterministic() {
        let store = MemoryStore::new();
        for n in 0..12 {
            store.put(&format!("a/height_{n}.car.zst"), &b"x"[..]);
        }
        let bucket = memory_bucket(store);

        let query = ListingQuery {
            prefix: "a/".to_string(),
            limit: Some(5),
            offset: 5,
            ..Default::default()
        };
        let first = list_bucket(&bucket, &query).await.unwrap();
        let second = list_bucket(&bucket, &query).await.unwrap();
        assert_eq!(first, second);
    }
}
