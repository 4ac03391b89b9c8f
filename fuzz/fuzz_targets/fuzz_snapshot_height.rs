//! Fuzz target for `snapshot_height` - height token extraction.
//!
//! This fuzzer tests that:
//! 1. No input causes a panic
//! 2. The parse is deterministic
//! 3. A key with no `height_` marker always yields 0
//!
//! Run with: `cargo +nightly fuzz run fuzz_snapshot_height`

#![no_main]

use carport::listing::snapshot_height;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|key: &str| {
    // The function must never panic
    let height = snapshot_height(key);

    // INVARIANT 1: deterministic
    assert_eq!(height, snapshot_height(key));

    // INVARIANT 2: no marker means height 0
    if !key.contains("height_") {
        assert_eq!(height, 0, "nonzero height without a marker: {key:?}");
    }

    // INVARIANT 3: a parsed height round-trips as a substring of the key
    if height != 0 {
        assert!(
            key.contains(&height.to_string()),
            "height {height} not present in key {key:?}"
        );
    }
});
