//! The flattened key/value store every source speaks.
//!
//! Sources never touch the config struct. They `set` raw keys and string
//! values into a [`FlatStore`]; the filler reads them back by canonical key.
//! The store remembers which keys were read so a strict source can report
//! the ones nothing asked for.

use indexmap::{IndexMap, IndexSet};

use crate::case::{self, DOT};

/// What the filler needs from a store.
pub trait Source {
    /// Value at `key`, or `""` when absent. Marks the key used.
    fn lookup(&mut self, key: &str) -> &str;

    /// Distinct first segments of every key under `prefix`, first-seen order.
    fn child_keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct Entry {
    original: String,
    value: String,
    used: bool,
}

/// Insertion-ordered map from canonical key to string value.
///
/// Writing a key that already exists moves it to the end and clears its
/// usage flag.
#[derive(Debug, Clone, Default)]
pub struct FlatStore {
    entries: IndexMap<String, Entry>,
}

impl FlatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize `raw_key` and store `value` under it.
    pub fn set(&mut self, raw_key: &str, value: impl Into<String>) {
        let key = case::to_dot_case(raw_key);
        self.entries.shift_remove(&key);
        self.entries.insert(
            key,
            Entry {
                original: raw_key.to_string(),
                value: value.into(),
                used: false,
            },
        );
    }

    /// Peek at a value without marking it used.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.value.as_str())
    }

    /// Keys in write order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Values in write order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, e)| (k.as_str(), e.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original spellings of every key never looked up, skipping `exclude`.
    ///
    /// An excluded key also covers its repeated positions, so excluding `f`
    /// skips `f.0`, `f.1` and so on.
    pub fn unused(&self, exclude: &[&str]) -> Vec<String> {
        let exclude: Vec<String> = exclude.iter().map(|k| case::to_dot_case(k)).collect();
        let excluded = |key: &str| {
            exclude.iter().any(|excluded| match key.strip_prefix(excluded.as_str()) {
                Some("") => true,
                Some(rest) => rest
                    .strip_prefix(DOT)
                    .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())),
                None => false,
            })
        };
        self.entries
            .iter()
            .filter(|(key, entry)| !entry.used && !excluded(key))
            .map(|(_, entry)| entry.original.clone())
            .collect()
    }

    /// Apply `other` on top of `self`, entry by entry, in its write order.
    pub fn merge(&mut self, other: FlatStore) {
        for (_, entry) in other.entries {
            self.set(&entry.original, entry.value);
        }
    }
}

impl Source for FlatStore {
    fn lookup(&mut self, key: &str) -> &str {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.used = true;
                entry.value.as_str()
            }
            None => "",
        }
    }

    fn child_keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut seen = IndexSet::new();
        for key in self.entries.keys() {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            let segment = rest.split(DOT).next().unwrap_or_default();
            if !segment.is_empty() {
                seen.insert(segment);
            }
        }
        seen.into_iter().map(str::to_string).collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> Extend<(K, V)> for FlatStore {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key.as_ref(), value);
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for FlatStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = FlatStore::new();
        store.extend(iter);
        store
    }
}
