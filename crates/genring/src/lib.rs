//! Generational bucket ring: fixed-lifetime key/value storage.
//!
//! A [`GenerationRing`] holds a fixed number of [`Bucket`]s. Entries are
//! always inserted into the *newest* bucket; a periodic rotation clears the
//! *oldest* bucket and repositions it as newest. An entry therefore lives for
//! at least one and at most `N` rotation periods, with no per-entry expiry
//! bookkeeping of any kind.
//!
//! # Features
//!
//! - **O(1) rotation**: expiry is one bucket clear plus an atomic cursor
//!   update; buckets never move
//! - **Newest-first reads**: the first hit on the read path is always the
//!   freshest copy of a key
//! - **Negative entries**: [`Entry::Negative`] records a confirmed absence as
//!   a first-class cached value, distinct from a plain miss
//! - **Concurrent lookups**: per-bucket reader-writer locks; readers never
//!   contend with each other
//!
//! # Example
//!
//! ```
//! use genring::{Entry, GenerationRing};
//!
//! let ring: GenerationRing<&str, u32> = GenerationRing::new("sessions", 3).unwrap();
//! ring.newest().insert("alice", Entry::Present(7));
//!
//! let hit = ring.iter_newest_to_oldest().find_map(|b| b.lookup(&"alice"));
//! assert_eq!(hit, Some(Entry::Present(7)));
//!
//! // Three rotations age the entry out.
//! for _ in 0..3 {
//!     ring.rotate();
//! }
//! assert!(ring.is_empty());
//! ```

mod bucket;
mod invariants;
mod ring;

pub use bucket::{Bucket, Entry};
pub use ring::{GenerationRing, RingError, Rotation};
