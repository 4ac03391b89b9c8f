//! Height token extraction from object keys.
//!
//! Snapshot keys embed the chain epoch as a `height_<digits>` token, e.g.
//! `mainnet/diff/forest_diff_mainnet_2024-12-03_height_4551360+3000.forest.car.zst`.
//! That token is the primary sort key for listings.

/// Marker preceding the digit run.
const HEIGHT_MARKER: &str = "height_";

/// Extracts the snapshot height from an object key.
///
/// Finds the first `height_` occurrence that is followed by at least one
/// ASCII digit and parses the maximal digit run after it. Keys without a
/// parseable height yield 0, so malformed keys sort after every real
/// snapshot instead of failing the listing.
///
/// # Examples
///
/// ```
/// use carport::listing::snapshot_height;
///
/// assert_eq!(snapshot_height("a/height_4551360.car.zst"), 4_551_360);
/// assert_eq!(snapshot_height("a/readme.txt"), 0);
/// ```
pub fn snapshot_height(key: &str) -> u64 {
    let mut rest = key;
    while let Some(pos) = rest.find(HEIGHT_MARKER) {
        let after = &rest[pos + HEIGHT_MARKER.len()..];
        let digits: &str = after
            .split_once(|c: char| !c.is_ascii_digit())
            .map_or(after, |(digits, _)| digits);

        if !digits.is_empty() {
            // A digit run that overflows u64 counts as a parse failure.
            return digits.parse().unwrap_or(0);
        }

        // "height_" with no digit after it does not match; keep scanning.
        rest = after;
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_height() {
        assert_eq!(snapshot_height("calibnet/diff/height_100.car.zst"), 100);
    }

    #[test]
    fn test_real_key_shape() {
        assert_eq!(
            snapshot_height(
                "mainnet/diff/forest_diff_mainnet_2024-12-03_height_4551360+3000.forest.car.zst"
            ),
            4_551_360
        );
    }

    #[test]
    fn test_digit_run_stops_at_non_digit() {
        assert_eq!(snapshot_height("a/height_42abc.car.zst"), 42);
        assert_eq!(snapshot_height("a/height_7+3000.car.zst"), 7);
    }

    #[test]
    fn test_no_marker_is_zero() {
        assert_eq!(snapshot_height("a/readme.txt"), 0);
        assert_eq!(snapshot_height(""), 0);
    }

    #[test]
    fn test_marker_without_digits_skips_to_next() {
        assert_eq!(snapshot_height("a/height_x_height_55.car.zst"), 55);
        assert_eq!(snapshot_height("a/height_.car.zst"), 0);
    }

    #[test]
    fn test_first_of_multiple_markers_wins() {
        assert_eq!(snapshot_height("height_10/height_20.car.zst"), 10);
    }

    #[test]
    fn test_overflow_is_zero() {
        assert_eq!(snapshot_height("a/height_99999999999999999999999.car.zst"), 0);
    }

    #[test]
    fn test_leading_zeros_parse() {
        assert_eq!(snapshot_height("a/height_007.car.zst"), 7);
    }
}
