use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// A cached value: either present, or confirmed absent by the resolver.
///
/// `Negative` is not the same as a key being absent from a bucket. Absence
/// means "unknown, must resolve"; `Negative` means "the resolver confirmed
/// there is no value, do not ask again until this entry ages out".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<V> {
    /// A value the resolver produced.
    Present(V),
    /// The resolver confirmed no value exists for this key.
    Negative,
}

impl<V> Entry<V> {
    /// Returns `true` for the negative marker.
    #[inline]
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::Negative)
    }

    /// Converts into the option form callers consume: `Negative` becomes `None`.
    #[inline]
    pub fn into_option(self) -> Option<V> {
        match self {
            Self::Present(v) => Some(v),
            Self::Negative => None,
        }
    }

    /// Borrowing variant of [`into_option`](Self::into_option).
    #[inline]
    pub fn as_option(&self) -> Option<&V> {
        match self {
            Self::Present(v) => Some(v),
            Self::Negative => None,
        }
    }
}

impl<V> From<Option<V>> for Entry<V> {
    /// `None` normalizes to the negative marker.
    fn from(value: Option<V>) -> Self {
        match value {
            Some(v) => Self::Present(v),
            None => Self::Negative,
        }
    }
}

/// One generation of cached entries.
///
/// A bucket is a key → [`Entry`] map guarded by a reader-writer lock:
/// lookups take the read lock and run concurrently, mutation takes the write
/// lock. Buckets carry no timestamp; their age is implied by their position
/// in the [`GenerationRing`](crate::GenerationRing).
///
/// The label identifies the bucket in logs and inspection output. It is
/// derived from the owning cache's name and the slot index, so two caches
/// never produce colliding labels.
#[derive(Debug)]
pub struct Bucket<K, V> {
    label: Box<str>,
    map: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> Bucket<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty bucket with the given label.
    pub fn new(label: impl Into<Box<str>>) -> Self {
        Self {
            label: label.into(),
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the bucket's label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Looks up a single key.
    ///
    /// Distinguishes all three states: `Some(Entry::Present(_))`,
    /// `Some(Entry::Negative)`, and `None` for a key this bucket has never
    /// seen.
    pub fn lookup(&self, key: &K) -> Option<Entry<V>> {
        self.read().get(key).cloned()
    }

    /// Splits `keys` into entries this bucket holds and keys it does not,
    /// under a single read lock.
    ///
    /// Hits are appended to `found`; the returned vector contains the keys
    /// that remain unresolved, in their original order.
    pub fn partition(&self, keys: Vec<K>, found: &mut Vec<(K, Entry<V>)>) -> Vec<K> {
        let map = self.read();
        let mut missing = Vec::new();
        for key in keys {
            match map.get(&key) {
                Some(entry) => found.push((key, entry.clone())),
                None => missing.push(key),
            }
        }
        missing
    }

    /// Inserts a single entry, overwriting any previous one for the key.
    pub fn insert(&self, key: K, entry: Entry<V>) {
        self.write().insert(key, entry);
    }

    /// Inserts a batch of entries under a single write lock. Later pairs win
    /// over earlier ones for duplicate keys.
    pub fn insert_many<I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (K, Entry<V>)>,
    {
        let mut map = self.write();
        for (key, entry) in pairs {
            map.insert(key, entry);
        }
    }

    /// Removes a key. Returns `true` if an entry was present.
    pub fn remove(&self, key: &K) -> bool {
        self.write().remove(key).is_some()
    }

    /// Empties the bucket, returning how many entries were evicted.
    pub fn clear(&self) -> usize {
        let mut map = self.write();
        let evicted = map.len();
        map.clear();
        evicted
    }

    /// Returns the number of entries currently held.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if the bucket holds no entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Clones out the full contents, for inspection and tests.
    pub fn snapshot(&self) -> Vec<(K, Entry<V>)> {
        self.read()
            .iter()
            .map(|(k, e)| (k.clone(), e.clone()))
            .collect()
    }

    // A writer can only panic between map operations, never halfway through
    // one, so a poisoned lock still guards a structurally sound map.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<K, Entry<V>>> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<K, Entry<V>>> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }
}
