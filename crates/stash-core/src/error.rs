use thiserror::Error;

/// Errors from filling a card.
#[derive(Debug, Error)]
pub enum FillError {
    /// The item failed an eligibility rule and cannot be stored.
    #[error("item is not storable: {0}")]
    Ineligible(String),

    /// Address resolution failed (hashing or probe exhaustion).
    #[error(transparent)]
    Resolve(#[from] stash_cache::CacheError),
}
