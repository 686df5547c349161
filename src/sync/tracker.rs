use std::collections::HashMap;
use std::hash::Hash;

/// Set-difference bookkeeping over a snapshot of store records.
///
/// Built once per pass from the records that existed before the pass ran.
/// The manifest loop [`mark`](Tracker::mark)s every record it touches;
/// whatever is left in [`remaining`](Tracker::remaining) was dropped from the
/// manifest and gets retired. Every snapshot record ends up either marked
/// once or reported as remaining — never lost, never duplicated.
pub struct Tracker<K, T> {
    entries: HashMap<K, T>,
}

impl<K: Eq + Hash, T> Tracker<K, T> {
    pub fn new<F>(snapshot: Vec<T>, key: F) -> Self
    where
        F: Fn(&T) -> K,
    {
        let entries = snapshot.into_iter().map(|record| (key(&record), record)).collect();
        Self { entries }
    }

    /// Mark the record with the given key as present in the manifest.
    ///
    /// Returns the record, or `None` for an unknown (or already marked) key —
    /// not an error, callers may ignore the miss.
    pub fn mark(&mut self, key: &K) -> Option<T> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the tracker, yielding every record that was never marked.
    pub fn remaining(self) -> Vec<T> {
        self.entries.into_values().collect()
    }
}
