//! HTTP `Range` header parsing for the download proxy.
//!
//! Only single byte ranges are supported (`bytes=a-b`, `bytes=a-`,
//! `bytes=-n`). Multi-range requests and anything syntactically off get
//! ignored, which per RFC 9110 means serving the full object with 200.
//! A well-formed range that no byte of the object satisfies is reported
//! as unsatisfiable so the handler can answer 416.

use crate::store::ByteRange;

/// Outcome of parsing a well-formed `Range` header against an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedRange {
    /// The range resolves to these bytes (end clamped to the object).
    Satisfiable(ByteRange),
    /// Well-formed, but outside the object entirely.
    Unsatisfiable,
}

/// Parses a `Range` header value against an object of `total` bytes.
///
/// Returns `None` when the header is malformed or multi-range, in which
/// case the caller serves the full object.
pub fn parse_range(header: &str, total: u64) -> Option<ParsedRange> {
    let spec = header.strip_prefix("bytes=")?.trim();
    if spec.contains(',') {
        // Multi-range requests fall back to the full object.
        return None;
    }

    let (start, end) = spec.split_once('-')?;
    let start = start.trim();
    let end = end.trim();

    if start.is_empty() {
        // Suffix form: the last `n` bytes.
        let suffix: u64 = end.parse().ok()?;
        if suffix == 0 || total == 0 {
            return Some(ParsedRange::Unsatisfiable);
        }
        let start = total.saturating_sub(suffix);
        return Some(ParsedRange::Satisfiable(ByteRange {
            start,
            end: total - 1,
        }));
    }

    let start: u64 = start.parse().ok()?;

    let end: u64 = if end.is_empty() {
        total.saturating_sub(1)
    } else {
        end.parse().ok()?
    };

    if start > end {
        return None;
    }
    if start >= total {
        return Some(ParsedRange::Unsatisfiable);
    }

    Some(ParsedRange::Satisfiable(ByteRange {
        start,
        end: end.min(total.saturating_sub(1)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfiable(start: u64, end: u64) -> Option<ParsedRange> {
        Some(ParsedRange::Satisfiable(ByteRange { start, end }))
    }

    #[test]
    fn test_bounded_range() {
        assert_eq!(parse_range("bytes=0-99", 1000), satisfiable(0, 99));
        assert_eq!(parse_range("bytes=500-999", 1000), satisfiable(500, 999));
    }

    #[test]
    fn test_end_clamped_to_object() {
        assert_eq!(parse_range("bytes=900-5000", 1000), satisfiable(900, 999));
    }

    #[test]
    fn test_open_ended_range() {
        assert_eq!(parse_range("bytes=950-", 1000), satisfiable(950, 999));
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(parse_range("bytes=-100", 1000), satisfiable(900, 999));
        // A suffix larger than the object covers all of it.
        assert_eq!(parse_range("bytes=-5000", 1000), satisfiable(0, 999));
    }

    #[test]
    fn test_unsatisfiable() {
        assert_eq!(parse_range("bytes=1000-", 1000), Some(ParsedRange::Unsatisfiable));
        assert_eq!(parse_range("bytes=2000-3000", 1000), Some(ParsedRange::Unsatisfiable));
        assert_eq!(parse_range("bytes=-0", 1000), Some(ParsedRange::Unsatisfiable));
        assert_eq!(parse_range("bytes=0-", 0), Some(ParsedRange::Unsatisfiable));
    }

    #[test]
    fn test_malformed_is_ignored() {
        for header in [
            "bytes=",
            "bytes=-",
            "bytes=abc-def",
            "bytes=5-2",
            "bytes=0-99,200-299",
            "items=0-99",
            "0-99",
        ] {
            assert_eq!(parse_range(header, 1000), None, "accepted: {header}");
        }
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(parse_range("bytes= 0-99 ", 1000), satisfiable(0, 99));
    }
}
