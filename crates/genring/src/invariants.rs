//! Debug assertion macros for generation ring invariants.
//!
//! Active in debug builds only (`debug_assert!`), so release builds pay
//! nothing for them.

/// Assert that the newest cursor addresses a valid slot.
///
/// **Invariant**: `cursor < slot_count` at all times.
///
/// Used in: `GenerationRing::newest_index()` after loading the cursor
macro_rules! debug_assert_cursor_in_bounds {
    ($cursor:expr, $slots:expr) => {
        debug_assert!(
            $cursor < $slots,
            "ring cursor {} out of bounds for {} slots",
            $cursor,
            $slots
        )
    };
}

/// Assert that a bucket entering the newest position starts empty.
///
/// **Invariant**: rotation clears the expiring bucket before repositioning
/// it as the insert target.
///
/// Used in: `GenerationRing::rotate()` after clearing the oldest bucket
macro_rules! debug_assert_rotated_in_empty {
    ($bucket:expr) => {
        debug_assert!(
            $bucket.is_empty(),
            "bucket {:?} promoted to newest while still holding entries",
            $bucket.label()
        )
    };
}

pub(crate) use debug_assert_cursor_in_bounds;
pub(crate) use debug_assert_rotated_in_empty;
