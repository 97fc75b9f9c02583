//! The card fill/open protocol.
//!
//! [`Stash`] is the resolver every higher-level operation builds on. It owns
//! the path from an item to a filled card and back:
//!
//! - [`Stash::fill`] — store a stack under its content address and mint a
//!   card referencing it (gated by eligibility)
//! - [`Stash::open`] — recover a copy of a card's stored contents, degrading
//!   to the card itself if the contents are missing
//! - [`Stash::depth`] — how many opens reach raw content, with a
//!   self-reference guard against corrupt chains
//! - eligibility — structural rules from a [`FillPolicy`] collaborator plus
//!   the full-stack and nesting-depth requirements
//!
//! A card's lifetime is the only state machine here, and it is computed
//! from data, never stored: raw content becomes a filled card via `fill`,
//! and `open` steps back down one level per call.

mod error;
mod policy;
mod stash;

pub use error::FillError;
pub use policy::{FillPolicy, StandardPolicy};
pub use stash::{mark_keep, CardSummary, Stash, MAX_DEPTH};
