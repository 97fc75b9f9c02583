//! Migration of card chains across hashing-scheme changes.
//!
//! When the hashing or serialization scheme changes, existing filled cards
//! reference addresses the current scheme would no longer derive. The
//! [`Migrator`] walks every card in a slot collection down to its root
//! content, then rebuilds the chain outward through the current resolver so
//! every layer gets a fresh address, preserving the quantity carried at
//! each nesting level.
//!
//! Failure is isolated per card: a chain with a missing or self-referencing
//! layer is left untouched and contributes nothing to the conversion count.
//! Migration never errors for partial failures, and a second run over
//! already-current cards converts nothing.

use std::sync::Arc;

use tracing::{debug, warn};

use stash_core::Stash;
use stash_types::card::{self, CardKind, TAG_KEEP};
use stash_types::{classify, Address, Item, SlotCollection};

/// Rebuilds nested card chains under the current hashing scheme.
pub struct Migrator {
    stash: Arc<Stash>,
}

impl Migrator {
    /// Create a migrator resolving through `stash` (the *current* scheme).
    pub fn new(stash: Arc<Stash>) -> Self {
        Self { stash }
    }

    /// Migrate every card in the collection.
    ///
    /// Returns the total quantity converted: the sum of stack quantities of
    /// every card whose outermost address changed. Cards already current,
    /// cards opted out via the keep marker, and cards whose chains cannot
    /// be walked are all skipped.
    pub fn migrate(&self, slots: &mut dyn SlotCollection) -> u64 {
        let mut items = slots.read_all();
        let mut conversions: u64 = 0;
        let mut changed = false;

        for slot in items.iter_mut() {
            let Some(item) = slot.as_ref() else { continue };
            let Some(original) = migratable_address(item) else {
                continue;
            };
            let Some(rebuilt) = self.rebuild(item) else {
                debug!(address = %original.short(), "chain not walkable, card left as-is");
                continue;
            };
            if card::card_address(&rebuilt) == Some(original) {
                continue;
            }
            conversions += u64::from(rebuilt.quantity);
            *slot = Some(rebuilt);
            changed = true;
        }

        if changed {
            slots.replace_all(items);
        }
        conversions
    }

    /// Walk a card's chain inward, then rebuild it outward under the
    /// current scheme. `None` if any layer is missing or self-referencing.
    fn rebuild(&self, outer: &Item) -> Option<Item> {
        // Inward walk, recording the quantity carried at each layer.
        let mut quantities = vec![outer.quantity];
        let mut current = outer.clone();
        let innermost = loop {
            let stored = self.stash.contents(&current)?;
            if stored.same_content(&current) {
                warn!("self-referencing card chain, skipping migration");
                return None;
            }
            if migratable_address(&stored).is_none() {
                // Raw content, or a card exempted from migration: the walk
                // bottoms out here and the layer is rebuilt as-is.
                break stored;
            }
            quantities.push(stored.quantity);
            current = stored;
        };

        // A stale blank card is re-minted rather than carried verbatim.
        let mut rebuilt = if card::is_blank_card(&innermost) {
            let mut fresh = card::blank_card();
            fresh.quantity = innermost.quantity;
            fresh
        } else {
            innermost
        };

        // Outward rebuild: filling re-derives each layer's address under
        // the current scheme; the recorded quantity is reapplied on top.
        for &quantity in quantities.iter().rev() {
            let mut layer = self.stash.fill_unchecked(&rebuilt).ok()?;
            layer.quantity = quantity;
            rebuilt = layer;
        }
        Some(rebuilt)
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator").finish()
    }
}

/// The address a card should be migrated from, or `None` for raw items,
/// blanks, and cards carrying the keep marker.
fn migratable_address(item: &Item) -> Option<Address> {
    if item.has_tag(TAG_KEEP) {
        return None;
    }
    match classify(item) {
        CardKind::Filled(address) => Some(address),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use stash_cache::{BoundedCache, CacheConfig};
    use stash_codec::ContentHasher;
    use stash_core::mark_keep;
    use stash_store::{InMemoryObjectStore, ObjectStore};
    use stash_types::card::card_address;
    use stash_types::VecSlots;

    /// Two stashes over one store, hashing under different schemes: the
    /// "old" stash builds chains, the "new" one migrates them.
    fn old_and_new() -> (Arc<Stash>, Arc<Stash>) {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemoryObjectStore::new());
        let old_cache = BoundedCache::with_hasher(
            Arc::clone(&store),
            CacheConfig::default(),
            ContentHasher::new("stash-stack-v0"),
        );
        let new_cache = BoundedCache::new(Arc::clone(&store), CacheConfig::default());
        (
            Arc::new(Stash::new(Arc::new(old_cache))),
            Arc::new(Stash::new(Arc::new(new_cache))),
        )
    }

    fn dirt() -> Item {
        Item::new("dirt", 64, 64)
    }

    /// Build dirt -> card (qty 3) -> outer card (qty 2) under `stash`,
    /// flushing so the chain is durable for other resolvers.
    fn nested_chain(stash: &Stash) -> Item {
        let mut inner = stash.fill(&dirt()).unwrap();
        inner.quantity = 3;
        let mut outer = stash.fill_unchecked(&inner).unwrap();
        outer.quantity = 2;
        stash.cache().flush();
        outer
    }

    #[test]
    fn migrates_a_nested_chain_preserving_quantities() {
        let (old, new) = old_and_new();
        let outer = nested_chain(&old);
        let old_address = card_address(&outer).unwrap();

        let mut slots = VecSlots::new(4);
        slots.set(1, Some(outer));

        let converted = Migrator::new(Arc::clone(&new)).migrate(&mut slots);
        assert_eq!(converted, 2); // outermost stack quantity

        let migrated = slots.get(1).unwrap().clone();
        assert_ne!(card_address(&migrated), Some(old_address));
        assert_eq!(migrated.quantity, 2);

        // The rebuilt chain opens layer by layer with preserved quantities.
        let middle = new.open(&migrated);
        assert!(card::is_filled_card(&middle));
        assert_eq!(middle.quantity, 3);
        assert_eq!(new.open(&middle), dirt());
    }

    #[test]
    fn migration_is_idempotent() {
        let (old, new) = old_and_new();
        let mut slots = VecSlots::new(2);
        slots.set(0, Some(nested_chain(&old)));

        let migrator = Migrator::new(Arc::clone(&new));
        assert!(migrator.migrate(&mut slots) > 0);
        assert_eq!(migrator.migrate(&mut slots), 0);
    }

    #[test]
    fn current_cards_are_not_touched() {
        let (_, new) = old_and_new();
        let card = new.fill(&dirt()).unwrap();
        new.cache().flush();

        let mut slots = VecSlots::new(1);
        slots.set(0, Some(card.clone()));

        assert_eq!(Migrator::new(Arc::clone(&new)).migrate(&mut slots), 0);
        assert_eq!(slots.get(0), Some(&card));
    }

    #[test]
    fn keep_marked_cards_are_skipped() {
        let (old, new) = old_and_new();
        let mut card = old.fill(&dirt()).unwrap();
        old.cache().flush();
        mark_keep(&mut card);

        let mut slots = VecSlots::new(1);
        slots.set(0, Some(card.clone()));

        assert_eq!(Migrator::new(Arc::clone(&new)).migrate(&mut slots), 0);
        assert_eq!(slots.get(0), Some(&card));
    }

    #[test]
    fn keep_marked_inner_layer_is_rebuilt_as_is() {
        let (old, new) = old_and_new();
        let mut inner = old.fill(&dirt()).unwrap();
        mark_keep(&mut inner);
        inner.quantity = 5;
        let outer = old.fill_unchecked(&inner).unwrap();
        old.cache().flush();

        let mut slots = VecSlots::new(1);
        slots.set(0, Some(outer));

        let converted = Migrator::new(Arc::clone(&new)).migrate(&mut slots);
        assert_eq!(converted, 1);

        // The exempt inner card kept its old address and its keep marker.
        let migrated = slots.get(0).unwrap().clone();
        let rebuilt_inner = new.open(&migrated);
        assert_eq!(rebuilt_inner, inner);
    }

    #[test]
    fn missing_layer_aborts_only_that_card() {
        let (old, new) = old_and_new();
        // A broken card: its address was never written anywhere.
        let broken = card::filled_card(&Address::from_hash([0xee; 32]));
        let sound = nested_chain(&old);

        let mut slots = VecSlots::new(3);
        slots.set(0, Some(broken.clone()));
        slots.set(2, Some(sound));

        let converted = Migrator::new(Arc::clone(&new)).migrate(&mut slots);
        assert_eq!(converted, 2); // only the sound chain converted
        assert_eq!(slots.get(0), Some(&broken));
    }

    #[test]
    fn raw_items_and_blanks_are_ignored() {
        let (_, new) = old_and_new();
        let mut slots = VecSlots::new(3);
        slots.set(0, Some(dirt()));
        slots.set(1, Some(card::blank_card()));

        assert_eq!(Migrator::new(Arc::clone(&new)).migrate(&mut slots), 0);
    }

    #[test]
    fn stale_blank_root_is_reminted() {
        let (old, new) = old_and_new();
        // A card whose contents are a stack of blank cards.
        let mut blanks = card::blank_card();
        blanks.quantity = 16;
        let outer = old.fill_unchecked(&blanks).unwrap();
        old.cache().flush();

        let mut slots = VecSlots::new(1);
        slots.set(0, Some(outer));

        assert_eq!(Migrator::new(Arc::clone(&new)).migrate(&mut slots), 1);
        let migrated = slots.get(0).unwrap().clone();
        let contents = new.open(&migrated);
        assert!(card::is_blank_card(&contents));
        assert_eq!(contents.quantity, 16);
    }

    #[test]
    fn self_referencing_chain_is_skipped() {
        let (_, new) = old_and_new();
        // Corrupt data: a card stored under the address it references.
        let address = Address::from_hash([0x44; 32]);
        let card = card::filled_card(&address);
        new.cache().put(address, card.clone());

        let mut slots = VecSlots::new(1);
        slots.set(0, Some(card.clone()));

        assert_eq!(Migrator::new(Arc::clone(&new)).migrate(&mut slots), 0);
        assert_eq!(slots.get(0), Some(&card));
    }
}
