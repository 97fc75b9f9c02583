//! Durable content-addressed storage for item stacks.
//!
//! Every stored stack lives under its content [`Address`]. The store is a
//! pure address→item map with three invariants:
//!
//! 1. `put` is idempotent — the first writer wins, and an address is never
//!    overwritten. Content at a final address is invariant, so a racing
//!    duplicate write is at worst a redundant disk write, never corruption.
//! 2. A missing address is not an error: `get` returns `Ok(None)`.
//! 3. Addresses are never removed once written. Cards referencing them may
//!    exist indefinitely, so there is no garbage collection.
//!
//! # Backends
//!
//! - [`FsObjectStore`] — one file per address under a data directory
//! - [`InMemoryObjectStore`] — `HashMap`-based store for tests and embedding
//!
//! [`Address`]: stash_types::Address

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::ObjectStore;
