use thiserror::Error;

/// Errors from object store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored bytes could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] stash_codec::CodecError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
