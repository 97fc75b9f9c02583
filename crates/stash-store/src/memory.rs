use std::collections::HashMap;
use std::sync::RwLock;

use stash_types::{Address, Item};

use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// In-memory, `HashMap`-based object store.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock`
/// and cloned on read; first-writer-wins semantics match the filesystem
/// backend.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<Address, Item>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stacks currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, address: &Address, item: &Item) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        map.entry(*address).or_insert_with(|| item.clone());
        Ok(())
    }

    fn get(&self, address: &Address) -> StoreResult<Option<Item>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(address).cloned())
    }

    fn contains(&self, address: &Address) -> StoreResult<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(address))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}
