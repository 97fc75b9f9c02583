use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid base-36 address: {0}")]
    InvalidAddress(String),

    #[error("address value exceeds 256 bits")]
    AddressOverflow,
}
