//! Foundation types for the stash workspace.
//!
//! This crate provides the data model shared by every other stash crate:
//!
//! - [`Item`] — a stack of some item kind, with tags and an opaque payload
//! - [`Address`] — content-derived identifier, rendered base-36
//! - [`CardKind`] — closed classification of an item as raw content, a blank
//!   card, or a filled card referencing stored contents
//! - [`SlotCollection`] — the ordered, fixed-size slot sequence that batch
//!   and migration operations run over
//!
//! Cards are ordinary [`Item`]s of the [`card::CARD_KIND`] kind carrying
//! well-known tags; card-ness is data, not a separate type, so cards can be
//! stacked, stored, and nested like any other item.

pub mod address;
pub mod card;
pub mod error;
pub mod item;
pub mod slots;

pub use address::Address;
pub use card::{classify, CardKind};
pub use error::TypeError;
pub use item::Item;
pub use slots::{SlotCollection, VecSlots};
