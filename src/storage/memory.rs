use std::collections::BTreeMap;

use super::{quota::StorageEstimate, validate_key, KeyValueStore};
use crate::error::StudioResult;

// Memory store
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    map: BTreeMap<String, String>,
    quota: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports usage against `quota` bytes.
    pub fn with_quota(quota: u64) -> Self {
        Self { map: BTreeMap::new(), quota: Some(quota) }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StudioResult<Option<String>> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StudioResult<()> {
        validate_key(key)?;
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StudioResult<()> {
        self.map.remove(key);
        Ok(())
    }

    fn keys(&self) -> StudioResult<Vec<String>> {
        Ok(self.map.keys().cloned().collect())
    }

    fn clear(&mut self) -> StudioResult<()> {
        self.map.clear();
        Ok(())
    }

    fn estimate(&self) -> StudioResult<Option<StorageEstimate>> {
        let Some(quota) = self.quota else {
            return Ok(None);
        };
        let used = self.map.iter().map(|(k, v)| (k.len() + v.len()) as u64).sum();
        Ok(Some(StorageEstimate::new(used, quota)))
    }
}
