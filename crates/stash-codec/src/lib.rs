//! Canonical encoding and content hashing for stash items.
//!
//! Two encodings live here:
//!
//! - the **content encoding** ([`encode_content`]): a quantity-stripped
//!   canonical byte form, hashed to derive an item's [`Address`]. Two stacks
//!   with equal content encode identically at any quantity.
//! - the **storage encoding** ([`encode_item`]/[`decode_item`]): the full
//!   item, quantity included, as persisted by the object store.
//!
//! Both use bincode over serde derives. Determinism comes from the item
//! model itself: tags are a `BTreeMap`, so equal content always serializes
//! to equal bytes.
//!
//! [`Address`]: stash_types::Address

mod encode;
mod hasher;

pub use encode::{decode_item, encode_content, encode_item};
pub use hasher::ContentHasher;

use thiserror::Error;

/// Errors from encoding or hashing an item.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Serialization failed. Fatal to the calling operation, never swallowed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored bytes could not be decoded back into an item.
    #[error("malformed stored item: {0}")]
    Malformed(String),
}
