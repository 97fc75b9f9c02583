use serde::{Deserialize, Serialize};

use crate::item::Item;

/// An ordered, fixed-size sequence of optional item slots.
///
/// Batch assembly and migration operate on this contract with read/replace
/// semantics: read the whole collection, mutate an owned copy, then commit
/// it back in one `replace_all`. Abandoning the copy is a rollback.
///
/// A slot collection is owned by one logical actor per operation; callers
/// serialize concurrent operations against the same collection externally.
pub trait SlotCollection {
    /// Snapshot every slot in order.
    fn read_all(&self) -> Vec<Option<Item>>;

    /// Replace every slot. `slots` must have the same length as the
    /// collection.
    fn replace_all(&mut self, slots: Vec<Option<Item>>);
}

/// The reference `SlotCollection`: a plain vector of slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VecSlots {
    slots: Vec<Option<Item>>,
}

impl VecSlots {
    /// Create an empty collection of `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Wrap an existing slot vector.
    pub fn from_slots(slots: Vec<Option<Item>>) -> Self {
        Self { slots }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the collection has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Borrow a slot.
    pub fn get(&self, index: usize) -> Option<&Item> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Set a slot, returning the previous occupant.
    pub fn set(&mut self, index: usize, item: Option<Item>) -> Option<Item> {
        std::mem::replace(&mut self.slots[index], item)
    }

    /// Place an item into the first empty slot. Returns the slot index, or
    /// `None` if the collection is full.
    pub fn place(&mut self, item: Item) -> Option<usize> {
        let index = self.slots.iter().position(Option::is_none)?;
        self.slots[index] = Some(item);
        Some(index)
    }

    /// Iterate occupied slots as `(index, item)`.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &Item)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|item| (i, item)))
    }
}

impl SlotCollection for VecSlots {
    fn read_all(&self) -> Vec<Option<Item>> {
        self.slots.clone()
    }

    fn replace_all(&mut self, slots: Vec<Option<Item>>) {
        debug_assert_eq!(slots.len(), self.slots.len(), "slot count must not change");
        self.slots = slots;
    }
}
