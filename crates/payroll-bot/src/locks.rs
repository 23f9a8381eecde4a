//! Per-key async mutual exclusion.

use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Default maximum number of keys to track before evicting idle ones.
pub const DEFAULT_MAX_KEYS: usize = 10000;

/// A map of independently lockable values.
///
/// Locking one key never waits on another. Holders of the same key are
/// serialized. The map keeps at most `max_keys` entries; when it grows past
/// that, the least recently locked entries that nobody holds or waits for
/// are dropped, so their values reset to `V::default()` on next use.
#[derive(Debug)]
pub struct KeyedMutex<K, V> {
    entries: Mutex<IndexMap<K, Arc<Mutex<V>>>>,
    max_keys: usize,
}

impl<K, V> Default for KeyedMutex<K, V>
where
    K: Hash + Eq + Clone,
    V: Default,
{
    fn default() -> Self {
        Self::new(DEFAULT_MAX_KEYS)
    }
}

impl<K, V> KeyedMutex<K, V>
where
    K: Hash + Eq + Clone,
    V: Default,
{
    pub fn new(max_keys: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            max_keys: max_keys.max(1),
        }
    }

    /// Lock the value for `key`, creating it on first use.
    ///
    /// This marks the key as recently used for eviction purposes.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<V> {
        let entry = {
            let mut entries = self.entries.lock().await;

            // Remove and re-insert to move to end (mark as recently used)
            let entry = entries
                .shift_remove(key)
                .unwrap_or_else(|| Arc::new(Mutex::new(V::default())));
            entries.insert(key.clone(), entry.clone());

            while entries.len() > self.max_keys {
                // Only the map holds an idle entry.
                let idle = entries
                    .values()
                    .position(|entry| Arc::strong_count(entry) == 1);
                match idle {
                    Some(index) => {
                        entries.shift_remove_index(index);
                    }
                    None => break,
                }
            }
            entry
        };
        entry.lock_owned().await
    }

    /// Number of tracked keys.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
