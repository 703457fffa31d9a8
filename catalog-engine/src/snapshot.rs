//! Authoritative catalog snapshot - the last list the server vouched for.

use std::collections::HashMap;

use catalog_types::{CatalogEntry, CatalogEntryKey};

/// Ordered server catalog with key lookup.
///
/// Only replaced wholesale: by a successful fetch or by a save response.
/// The `Default` snapshot is unloaded: the server has not vouched for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritativeSnapshot {
    entries: Vec<CatalogEntry>,
    index: HashMap<CatalogEntryKey, usize>,
    loaded: bool,
}

impl AuthoritativeSnapshot {
    /// Build a snapshot, keeping the first entry for any duplicated key.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        let mut kept = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for entry in entries {
            if index.contains_key(&entry.key) {
                tracing::warn!(key = %entry.key, "Duplicate catalog key from server, keeping first");
                continue;
            }
            index.insert(entry.key.clone(), kept.len());
            kept.push(entry);
        }
        Self {
            entries: kept,
            index,
            loaded: true,
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, key: &CatalogEntryKey) -> Option<&CatalogEntry> {
        self.index.get(key).map(|idx| &self.entries[*idx])
    }

    pub fn contains(&self, key: &CatalogEntryKey) -> bool {
        self.index.contains_key(key)
    }

    /// False until the server has supplied a catalog, even an empty one.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
