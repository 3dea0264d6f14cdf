use crate::invariants::{debug_assert_cursor_in_bounds, debug_assert_rotated_in_empty};
use crate::Bucket;
use crossbeam_utils::CachePadded;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

// =============================================================================
// SYNCHRONIZATION STRATEGY
// =============================================================================
//
// The ring is a fixed slice of buckets plus one atomic cursor marking the
// newest slot. Buckets never move; rotation is a cursor update.
//
// ## Single-Rotator Discipline
//
// Exactly one caller may invoke `rotate()`, `clear_all()`, `delete_from_all()`
// and the bulk insert paths at a time (the cache layer routes them through a
// single control task). Lookups may run from any number of threads at any
// time; they only ever take bucket read locks.
//
// ## Cursor Ordering Protocol
//
// - `rotate()` clears the oldest bucket, then stores the cursor with Release.
// - Readers load the cursor with Acquire, so a reader that observes the new
//   cursor also observes the cleared bucket.
// - A reader holding a pre-rotation cursor may briefly search the old order
//   and miss an entry that moved out from under it; it then falls through to
//   resolution. Staleness stays bounded by the rotation period either way.
//
// ## Bucket Slots
//
// Each slot is `CachePadded` so the write-lock word of one bucket does not
// false-share a cache line with its neighbor under concurrent lookups.
//
// =============================================================================

/// Construction errors for [`GenerationRing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// A ring needs at least one bucket to have an insert target.
    #[error("generation ring requires at least one bucket")]
    ZeroBuckets,
}

/// Report produced by one rotation, for logging and accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    /// Label of the bucket that expired (and became the new insert target).
    pub expired: Box<str>,
    /// Number of entries the expiring bucket held before it was cleared.
    pub evicted: usize,
    /// Label of the newest bucket after the rotation.
    pub newest: Box<str>,
    /// Label of the oldest bucket after the rotation.
    pub oldest: Box<str>,
}

/// A fixed ring of generation buckets with an O(1) rotation.
///
/// The ring holds exactly `N` buckets for its entire lifetime. An atomic
/// cursor marks the *newest* bucket (the insert target); the *oldest* sits at
/// `(cursor + 1) % N` and is the next to expire. Rotation clears the oldest
/// bucket and repositions it as newest by advancing the cursor; the buckets
/// themselves never move.
///
/// Reads walk the ring newest→oldest. An entry resolved repeatedly over
/// several generations leaves a copy in each bucket that was newest at the
/// time; searching newest-first guarantees the first hit is the freshest, so
/// staleness is bounded by the rotation period rather than by how many stale
/// copies exist.
#[derive(Debug)]
pub struct GenerationRing<K, V> {
    buckets: Box<[CachePadded<Bucket<K, V>>]>,
    /// Index of the newest bucket. Stored with Release by the rotator, loaded
    /// with Acquire by readers.
    cursor: AtomicUsize,
}

impl<K, V> GenerationRing<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a ring of `bucket_count` empty buckets.
    ///
    /// Bucket labels are derived from `name` and the slot index, so rings
    /// built with distinct names never produce colliding labels.
    pub fn new(name: &str, bucket_count: usize) -> Result<Self, RingError> {
        if bucket_count == 0 {
            return Err(RingError::ZeroBuckets);
        }

        let buckets: Box<[_]> = (0..bucket_count)
            .map(|slot| CachePadded::new(Bucket::new(format!("{name}/{slot}"))))
            .collect();

        Ok(Self {
            buckets,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the number of buckets, fixed at construction.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Index of the newest bucket.
    #[inline]
    pub fn newest_index(&self) -> usize {
        let cursor = self.cursor.load(Ordering::Acquire);
        debug_assert_cursor_in_bounds!(cursor, self.buckets.len());
        cursor
    }

    /// Index of the oldest bucket, the next to expire.
    #[inline]
    pub fn oldest_index(&self) -> usize {
        (self.newest_index() + 1) % self.buckets.len()
    }

    /// The current insert target.
    #[inline]
    pub fn newest(&self) -> &Bucket<K, V> {
        &*self.buckets[self.newest_index()]
    }

    /// The read path: buckets in newest→oldest order.
    pub fn iter_newest_to_oldest(&self) -> impl Iterator<Item = &Bucket<K, V>> + '_ {
        let len = self.buckets.len();
        let newest = self.newest_index();
        (0..len).map(move |step| &*self.buckets[(newest + len - step) % len])
    }

    /// Expires the oldest generation: clears the oldest bucket and
    /// repositions it as the new newest. All other buckets shift one step
    /// toward oldest. O(1): a cursor update plus one bucket clear.
    ///
    /// Callers must uphold the single-rotator discipline documented above.
    pub fn rotate(&self) -> Rotation {
        let len = self.buckets.len();
        let expiring = (self.cursor.load(Ordering::Relaxed) + 1) % len;
        debug_assert_cursor_in_bounds!(expiring, len);
        let bucket = &self.buckets[expiring];

        let evicted = bucket.clear();
        debug_assert_rotated_in_empty!(bucket);

        // Publish after the clear so readers that see the new cursor see the
        // emptied bucket.
        self.cursor.store(expiring, Ordering::Release);

        Rotation {
            expired: bucket.label().into(),
            evicted,
            newest: self.buckets[expiring].label().into(),
            oldest: self.buckets[(expiring + 1) % len].label().into(),
        }
    }

    /// Empties every bucket without touching ring positions. Returns the
    /// total number of evicted entries.
    pub fn clear_all(&self) -> usize {
        self.buckets.iter().map(|b| b.clear()).sum()
    }

    /// Removes `key` from every bucket. Returns `true` if any bucket held it.
    pub fn delete_from_all(&self, key: &K) -> bool {
        let mut removed = false;
        for bucket in self.buckets.iter() {
            removed |= bucket.remove(key);
        }
        removed
    }

    /// Bucket labels in newest→oldest order, for inspection.
    pub fn layout(&self) -> Vec<Box<str>> {
        self.iter_newest_to_oldest()
            .map(|b| b.label().into())
            .collect()
    }

    /// Total entries across all buckets. Approximate under concurrent writes.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }

    /// Returns `true` if no bucket holds an entry.
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.is_empty())
    }
}
