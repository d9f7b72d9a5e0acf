//! In-memory metadata store.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{MetaTarget, MetaValue, MetadataSink};

/// A [`MetadataSink`] that keeps everything in ordered maps.
///
/// Serializes to a JSON object keyed by the target's display form
/// (`"global"`, `"series 0 channel 1"`, ...).
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    entries: BTreeMap<MetaTarget, BTreeMap<String, MetaValue>>,
}

impl MetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value.
    pub fn get(&self, target: MetaTarget, key: &str) -> Option<&MetaValue> {
        self.entries.get(&target)?.get(key)
    }

    /// Look up a global value.
    pub fn global(&self, key: &str) -> Option<&MetaValue> {
        self.get(MetaTarget::Global, key)
    }

    /// All values recorded for `target`.
    pub fn entries(&self, target: MetaTarget) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries
            .get(&target)
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Every target that has at least one value.
    pub fn targets(&self) -> impl Iterator<Item = MetaTarget> + '_ {
        self.entries.keys().copied()
    }

    /// Total number of values across all targets.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl MetadataSink for MetadataStore {
    fn put(&mut self, target: MetaTarget, key: &str, value: MetaValue) {
        self.entries
            .entry(target)
            .or_default()
            .insert(key.to_string(), value);
    }
}

impl Serialize for MetadataStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (target, values) in &self.entries {
            map.serialize_entry(&target.to_string(), values)?;
        }
        map.end()
    }
}
