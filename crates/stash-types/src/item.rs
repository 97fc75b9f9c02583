use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tag marking an item as a container. Containers cannot be stored inside
/// cards, since their own contents would escape addressing.
pub const TAG_CONTAINER: &str = "item:container";

/// A stack of some item kind occupying one slot.
///
/// Everything except `quantity` is *content*: two stacks with equal content
/// share a content address regardless of how many units each holds. Stored
/// stacks are immutable once persisted; mutating content produces a new
/// address on the next store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item kind identifier, e.g. `"dirt"` or [`crate::card::CARD_KIND`].
    pub kind: String,
    /// Units currently in the stack. Never part of the content address.
    pub quantity: u32,
    /// Maximum units a single slot holds for this kind.
    pub max_stack: u32,
    /// String tags, including the card markers.
    pub tags: BTreeMap<String, String>,
    /// Opaque attachment carried with the item (serialized extra state).
    pub data: Vec<u8>,
}

impl Item {
    /// Create an item with no tags and no attachment.
    pub fn new(kind: impl Into<String>, quantity: u32, max_stack: u32) -> Self {
        Self {
            kind: kind.into(),
            quantity,
            max_stack,
            tags: BTreeMap::new(),
            data: Vec::new(),
        }
    }

    /// Builder: attach a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Builder: attach opaque data.
    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Builder: set the stack quantity.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Look up a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Whether a tag is present, regardless of value.
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Set or replace a tag in place.
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Remove a tag in place. Returns `true` if it was present.
    pub fn remove_tag(&mut self, key: &str) -> bool {
        self.tags.remove(key).is_some()
    }

    /// Whether the stack is at its maximum quantity.
    pub fn is_full_stack(&self) -> bool {
        self.quantity == self.max_stack
    }

    /// Content equality: every field except `quantity`.
    ///
    /// This is the equality notion used for collision probing and slot
    /// matching, consistent with quantity-free content addressing.
    pub fn same_content(&self, other: &Item) -> bool {
        self.kind == other.kind
            && self.max_stack == other.max_stack
            && self.tags == other.tags
            && self.data == other.data
    }
}
