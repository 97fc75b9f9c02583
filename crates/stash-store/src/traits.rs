use stash_types::{Address, Item};

use crate::error::StoreResult;

/// Content-addressed durable storage for item stacks.
///
/// All implementations must satisfy these invariants:
/// - `put` is idempotent and never overwrites: the first writer wins, and
///   content at a final address is invariant.
/// - A missing address is `Ok(None)` from `get`, not an error.
/// - Concurrent reads of distinct addresses never block one another;
///   concurrent writes of the same address are tolerated because identical
///   content makes duplicate writes harmless.
/// - I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Write `item` durably under `address` iff nothing is stored there yet.
    fn put(&self, address: &Address, item: &Item) -> StoreResult<()>;

    /// Read the item stored under `address`, or `None` if never written.
    fn get(&self, address: &Address) -> StoreResult<Option<Item>>;

    /// Whether anything is stored under `address`.
    fn contains(&self, address: &Address) -> StoreResult<bool>;
}
