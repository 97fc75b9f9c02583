use stash_types::{Address, Item};

use crate::encode::encode_content;
use crate::CodecError;

/// Domain-tagged BLAKE3 content hasher.
///
/// The domain tag is prepended to every hash computation, so two hashing
/// schemes (e.g. across a format revision) never share an address space.
/// Changing the tag is exactly the "hash scheme change" that migration
/// exists to absorb.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// The current stack-content hashing scheme.
    pub const STACK: Self = Self {
        domain: "stash-stack-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Compute the content address of an item.
    ///
    /// Pure and deterministic: equal content at any quantity maps to the
    /// same address, stable across process restarts. Serialization failure
    /// propagates as an error.
    pub fn address_of(&self, item: &Item) -> Result<Address, CodecError> {
        let content = encode_content(item)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(&content);
        Ok(Address::from_hash(*hasher.finalize().as_bytes()))
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
