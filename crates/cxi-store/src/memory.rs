use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use cxi_types::{EntityId, PropertyRecord};

use crate::error::{StoreError, StoreResult};
use crate::key::{RecordKey, RecordSet};
use crate::traits::PropertyStore;

/// In-memory, BTreeMap-based property store.
///
/// Intended for tests and small exports. Records are held behind a `RwLock`
/// and cloned on read/write.
pub struct InMemoryPropertyStore {
    records: RwLock<BTreeMap<RecordKey, PropertyRecord>>,
    sealed: AtomicBool,
}

impl InMemoryPropertyStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }

    /// All keys in key order.
    pub fn keys(&self) -> Vec<RecordKey> {
        self.records
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for InMemoryPropertyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyStore for InMemoryPropertyStore {
    fn get(&self, key: &RecordKey) -> StoreResult<Option<PropertyRecord>> {
        let map = self.records.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &RecordKey, record: &PropertyRecord) -> StoreResult<()> {
        if self.is_sealed() {
            return Err(StoreError::ReadOnly);
        }
        let mut map = self.records.write().expect("lock poisoned");
        map.insert(key.clone(), record.clone());
        Ok(())
    }

    fn contains(&self, key: &RecordKey) -> StoreResult<bool> {
        let map = self.records.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    fn list_ids(&self, set: &RecordSet) -> StoreResult<Vec<EntityId>> {
        let map = self.records.read().expect("lock poisoned");
        let mut ids: Vec<EntityId> = map.keys().filter_map(|key| set.member_id(key)).collect();
        ids.sort();
        Ok(ids)
    }

    fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for InMemoryPropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPropertyStore")
            .field("record_count", &self.len())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
