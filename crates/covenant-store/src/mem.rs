//! In-memory `KvStore` used by unit/integration tests and as a reference
//! implementation of the host contract. Production hosts supply their own
//! ordered store (e.g. an IAVL/RocksDB-backed tree); this crate never
//! assumes more than `KvStore` promises.

use std::collections::BTreeMap;

use crate::KvStore;

#[derive(Debug, Default, Clone)]
pub struct MemKvStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemKvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.data.insert(key.to_vec(), value);
    }

    fn remove(&mut self, key: &[u8]) {
        self.data.remove(key);
    }

    fn prefix_iterate(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn range_iterate(&self, lower: &[u8], upper: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .range(lower.to_vec()..=upper.to_vec())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
