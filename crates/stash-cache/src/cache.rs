use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use stash_codec::ContentHasher;
use stash_store::ObjectStore;
use stash_types::{Address, Item};

use crate::CacheError;

/// Upper bound on collision-probing attempts before giving up.
pub const MAX_PROBES: usize = 65_536;

/// Tuning for [`BoundedCache`].
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Maximum entries held in memory (default: 500).
    pub capacity: usize,
    /// Entries idle longer than this are evicted (default: 30 minutes).
    pub idle_expiry: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            idle_expiry: Duration::from_secs(30 * 60),
        }
    }
}

struct CacheEntry {
    item: Item,
    last_access: Instant,
    /// Whether the entry has changes the store has not seen yet.
    dirty: bool,
}

/// Capacity- and idle-bounded cache with eviction-triggered write-back.
///
/// Internally synchronized; `get`/`put`/`flush` may be called from any
/// thread. Eviction write-back runs on whichever thread triggered the
/// eviction and holds the cache lock for at most one store write per
/// evicted dirty entry.
pub struct BoundedCache {
    entries: Mutex<HashMap<Address, CacheEntry>>,
    store: Arc<dyn ObjectStore>,
    hasher: ContentHasher,
    config: CacheConfig,
}

impl BoundedCache {
    /// Create a cache over `store` using the current hashing scheme.
    pub fn new(store: Arc<dyn ObjectStore>, config: CacheConfig) -> Self {
        Self::with_hasher(store, config, ContentHasher::STACK)
    }

    /// Create a cache with an explicit hashing scheme. Used when operating
    /// a store under a non-default (e.g. superseded) scheme.
    pub fn with_hasher(
        store: Arc<dyn ObjectStore>,
        config: CacheConfig,
        hasher: ContentHasher,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            store,
            hasher,
            config,
        }
    }

    /// The store this cache fronts.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Look up a stack by address.
    ///
    /// A fresh cached entry is returned directly; otherwise the store is
    /// consulted. `None` means "address never written" — an expected,
    /// silent outcome. Store errors other than not-found are logged and
    /// degrade to a miss.
    pub fn get(&self, address: &Address) -> Option<Item> {
        let mut entries = self.lock();
        self.sweep_expired(&mut entries);

        if let Some(entry) = entries.get_mut(address) {
            entry.last_access = Instant::now();
            return Some(entry.item.clone());
        }

        match self.store.get(address) {
            Ok(Some(item)) => {
                entries.insert(
                    *address,
                    CacheEntry {
                        item: item.clone(),
                        last_access: Instant::now(),
                        dirty: false,
                    },
                );
                self.enforce_capacity(&mut entries);
                Some(item)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(address = %address.short(), error = %e, "store read failed, treating as miss");
                None
            }
        }
    }

    /// Insert or refresh a stack in memory. Durability is deferred to
    /// eviction or [`flush`](Self::flush).
    pub fn put(&self, address: Address, item: Item) {
        let mut entries = self.lock();
        self.sweep_expired(&mut entries);

        entries.insert(
            address,
            CacheEntry {
                item,
                last_access: Instant::now(),
                dirty: true,
            },
        );
        self.enforce_capacity(&mut entries);
    }

    /// Resolve the final address for an item's content.
    ///
    /// Computes the content hash, then probes successor addresses while the
    /// candidate address holds *different* content. An address holding
    /// content equal to the candidate is a reuse, not a collision. Probing
    /// is capped at [`MAX_PROBES`].
    pub fn resolve_address(&self, item: &Item) -> Result<Address, CacheError> {
        let mut address = self.hasher.address_of(item)?;
        for probe in 0..MAX_PROBES {
            match self.get(&address) {
                Some(existing) if !existing.same_content(item) => {
                    debug!(
                        address = %address.short(),
                        probe,
                        "address collision, probing successor"
                    );
                    address = address.successor();
                }
                _ => return Ok(address),
            }
        }
        Err(CacheError::AddressSpaceExhausted)
    }

    /// Persist every dirty entry without evicting. Returns the number of
    /// entries written. Store failures are logged and leave the entry
    /// dirty for a later attempt.
    pub fn flush(&self) -> usize {
        let mut entries = self.lock();
        let mut persisted = 0;
        for (address, entry) in entries.iter_mut() {
            if !entry.dirty {
                continue;
            }
            match self.store.put(address, &entry.item) {
                Ok(()) => {
                    entry.dirty = false;
                    persisted += 1;
                }
                Err(e) => {
                    warn!(address = %address.short(), error = %e, "flush write failed");
                }
            }
        }
        persisted
    }

    /// Number of entries currently cached.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Address, CacheEntry>> {
        self.entries.lock().expect("cache lock poisoned")
    }

    /// Evict every entry idle longer than the configured expiry.
    fn sweep_expired(&self, entries: &mut HashMap<Address, CacheEntry>) {
        let now = Instant::now();
        let stale: Vec<Address> = entries
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_access) >= self.config.idle_expiry)
            .map(|(address, _)| *address)
            .collect();
        for address in stale {
            if let Some(entry) = entries.remove(&address) {
                self.write_back(&address, entry);
            }
        }
    }

    /// Evict least-recently-accessed entries until within capacity.
    fn enforce_capacity(&self, entries: &mut HashMap<Address, CacheEntry>) {
        while entries.len() > self.config.capacity {
            let victim = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(address, _)| *address);
            let Some(address) = victim else { break };
            if let Some(entry) = entries.remove(&address) {
                self.write_back(&address, entry);
            }
        }
    }

    /// Persist an evicted entry if the store has not seen it yet.
    fn write_back(&self, address: &Address, entry: CacheEntry) {
        if !entry.dirty {
            return;
        }
        match self.store.put(address, &entry.item) {
            Ok(()) => debug!(address = %address.short(), "write-back on eviction"),
            Err(e) => {
                warn!(address = %address.short(), error = %e, "write-back failed, dropping entry");
            }
        }
    }
}

impl std::fmt::Debug for BoundedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("entries", &self.len())
            .field("capacity", &self.config.capacity)
            .finish()
    }
}
