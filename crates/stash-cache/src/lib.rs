//! Bounded in-memory cache fronting the object store.
//!
//! [`BoundedCache`] keeps recently used stacks in memory so repeated card
//! operations avoid disk I/O. Durability is write-back: a `put` only marks
//! the entry dirty, and the store write happens when the entry is evicted
//! under capacity or idle-age pressure (or on an explicit [`flush`]). The
//! store's idempotent `put` makes redundant write-backs harmless; a dirty
//! flag avoids most of them.
//!
//! The cache is never the source of truth — the [`ObjectStore`] is. A miss
//! reloads lazily from the store; a store read error other than not-found
//! degrades to a miss (logged), never a crash.
//!
//! Collision-probing address resolution ([`BoundedCache::resolve_address`])
//! also lives here, because probing reads through the cached view.
//!
//! [`flush`]: BoundedCache::flush
//! [`ObjectStore`]: stash_store::ObjectStore

mod cache;

pub use cache::{BoundedCache, CacheConfig, MAX_PROBES};

use thiserror::Error;

/// Errors from cache-level operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Content could not be hashed (serialization failure).
    #[error(transparent)]
    Codec(#[from] stash_codec::CodecError),

    /// Collision probing exhausted [`MAX_PROBES`] consecutive addresses.
    ///
    /// Unreachable for accidental collisions; hitting it means the address
    /// space around this content is pathologically occupied.
    #[error("no free address within {MAX_PROBES} probes")]
    AddressSpaceExhausted,
}
