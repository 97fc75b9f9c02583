use std::sync::Arc;

use tracing::{debug, warn};

use stash_cache::BoundedCache;
use stash_types::card::{self, CardKind, TAG_KEEP};
use stash_types::{classify, Address, Item};

use crate::error::FillError;
use crate::policy::{FillPolicy, StandardPolicy};

/// Maximum nesting depth a fillable item may already have. Filling an item
/// at this depth is rejected, so chains never exceed `MAX_DEPTH` layers
/// through the fill path.
pub const MAX_DEPTH: u32 = 2;

/// The resolver: fills cards from items and opens them back.
pub struct Stash {
    cache: Arc<BoundedCache>,
    policy: Arc<dyn FillPolicy>,
}

impl Stash {
    /// Create a stash with the [`StandardPolicy`].
    pub fn new(cache: Arc<BoundedCache>) -> Self {
        Self::with_policy(cache, Arc::new(StandardPolicy::new()))
    }

    /// Create a stash with a custom eligibility policy.
    pub fn with_policy(cache: Arc<BoundedCache>, policy: Arc<dyn FillPolicy>) -> Self {
        Self { cache, policy }
    }

    /// The cache this stash resolves through.
    pub fn cache(&self) -> &Arc<BoundedCache> {
        &self.cache
    }

    /// Mint a single blank card.
    pub fn blank_card(&self) -> Item {
        card::blank_card()
    }

    /// Store `item` and mint a card referencing it.
    ///
    /// Checks eligibility first; the stored stack keeps its quantity, and
    /// the returned card has quantity 1.
    pub fn fill(&self, item: &Item) -> Result<Item, FillError> {
        if let Some(reason) = self.deny_reason(item, true) {
            return Err(FillError::Ineligible(reason));
        }
        self.fill_unchecked(item)
    }

    /// Store `item` and mint a card without the eligibility gate.
    ///
    /// For callers rebuilding chains that already exist (migration, batch
    /// internals), where intermediate layers legitimately carry non-full
    /// quantities.
    pub fn fill_unchecked(&self, item: &Item) -> Result<Item, FillError> {
        let address = self.cache.resolve_address(item)?;
        self.cache.put(address, item.clone());
        debug!(address = %address.short(), kind = %item.kind, quantity = item.quantity, "filled card");
        Ok(card::filled_card(&address))
    }

    /// Mint a card for an already-stored address, or `None` if nothing is
    /// stored there.
    pub fn card_for_address(&self, address: &Address) -> Option<Item> {
        self.cache.get(address)?;
        Some(card::filled_card(address))
    }

    /// A copy of the stack stored behind a filled card, or `None` if the
    /// item is not a filled card or its address was never written.
    pub fn contents(&self, item: &Item) -> Option<Item> {
        match classify(item) {
            CardKind::Filled(address) => self.cache.get(&address),
            _ => None,
        }
    }

    /// Open a card, recovering its stored contents.
    ///
    /// Always returns an owned copy — stored stacks are immutable and never
    /// handed out directly. If the contents are missing (store tampered or
    /// never written), the card itself is returned as a single unit rather
    /// than failing: a broken card degrades to a curiosity, not a crash.
    pub fn open(&self, item: &Item) -> Item {
        if let Some(stored) = self.contents(item) {
            return stored;
        }
        let mut fallback = item.clone();
        fallback.quantity = 1;
        fallback
    }

    /// Nesting depth: the number of opens needed to reach raw content.
    ///
    /// Zero for anything that is not a filled card. The walk stops early if
    /// an opened layer has the same content as the card it came from, which
    /// can only happen with a corrupt self-referencing chain; the depth at
    /// the point of detection is reported instead of looping.
    pub fn depth(&self, item: &Item) -> u32 {
        if !card::is_filled_card(item) {
            return 0;
        }
        let mut depth = 1;
        let mut current = item.clone();
        let mut inner = self.open(&current);
        while card::is_filled_card(&inner) {
            if inner.same_content(&current) {
                warn!(depth, "self-referencing card chain, capping depth");
                return depth;
            }
            depth += 1;
            current = inner;
            inner = self.open(&current);
        }
        depth
    }

    /// Whether `item` passes every fill rule.
    pub fn is_fillable(&self, item: &Item) -> bool {
        self.deny_reason(item, true).is_none()
    }

    /// The first reason `item` cannot be filled, or `None` if it can.
    ///
    /// `require_full_stack` relaxes the maximal-quantity rule for callers
    /// that accept partial stacks.
    pub fn deny_reason(&self, item: &Item, require_full_stack: bool) -> Option<String> {
        if item.quantity == 0 {
            return Some("empty stack".to_string());
        }
        if let Some(reason) = self.policy.deny(item) {
            return Some(reason);
        }
        if require_full_stack && !item.is_full_stack() {
            return Some(format!(
                "stack holds {} of {}, only full stacks are storable",
                item.quantity, item.max_stack
            ));
        }
        if self.depth(item) >= MAX_DEPTH {
            return Some("card nesting limit reached".to_string());
        }
        None
    }

    /// Summarize a filled card: its address, the innermost raw content, and
    /// the total quantity represented across every nesting layer (the
    /// product of per-layer quantities down to the root stack).
    ///
    /// `None` for anything that is not a filled card. The walk shares the
    /// self-reference guard with [`depth`](Self::depth): a corrupt chain is
    /// summarized down to the last sound layer.
    pub fn summary(&self, item: &Item) -> Option<CardSummary> {
        let CardKind::Filled(address) = classify(item) else {
            return None;
        };
        let mut total = u64::from(item.quantity);
        let mut current = item.clone();
        let mut inner = self.open(&current);
        while card::is_filled_card(&inner) {
            if inner.same_content(&current) {
                break;
            }
            total *= u64::from(inner.quantity);
            current = inner;
            inner = self.open(&current);
        }
        let root = if inner.same_content(&current) {
            current
        } else {
            total *= u64::from(inner.quantity);
            inner
        };
        Some(CardSummary {
            address,
            root,
            total_quantity: total,
        })
    }
}

impl std::fmt::Debug for Stash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stash").field("cache", &self.cache).finish()
    }
}

/// What a filled card holds, walked down to its root content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardSummary {
    /// The card's own address.
    pub address: Address,
    /// The innermost raw content stack.
    pub root: Item,
    /// Total units of the root content across all nesting layers.
    pub total_quantity: u64,
}

/// Opt a filled card out of hash migration. Returns `true` if the marker
/// was applied; blank cards and raw items are left untouched.
pub fn mark_keep(item: &mut Item) -> bool {
    if !card::is_filled_card(item) {
        return false;
    }
    item.set_tag(TAG_KEEP, "1");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use stash_cache::{BoundedCache, CacheConfig};
    use stash_store::InMemoryObjectStore;
    use stash_types::card::{blank_card, card_address, filled_card};

    fn new_stash() -> Stash {
        let store = Arc::new(InMemoryObjectStore::new());
        Stash::new(Arc::new(BoundedCache::new(store, CacheConfig::default())))
    }

    fn dirt() -> Item {
        Item::new("dirt", 64, 64)
    }

    /// Stack a card up to a full stack so it can be filled again.
    fn full_stack_of(card: &Item) -> Item {
        let mut stack = card.clone();
        stack.quantity = stack.max_stack;
        stack
    }

    // -----------------------------------------------------------------------
    // Fill / open round trip
    // -----------------------------------------------------------------------

    #[test]
    fn open_recovers_filled_content() {
        let stash = new_stash();
        let card = stash.fill(&dirt()).unwrap();

        assert_eq!(card.quantity, 1);
        assert!(card::is_filled_card(&card));
        assert_eq!(stash.open(&card), dirt());
    }

    #[test]
    fn open_returns_a_copy_not_the_original() {
        let stash = new_stash();
        let card = stash.fill(&dirt()).unwrap();

        let mut opened = stash.open(&card);
        opened.quantity = 1; // mutating the copy
        assert_eq!(stash.open(&card), dirt()); // stored stack unchanged
    }

    #[test]
    fn filling_equal_content_reuses_the_address() {
        let stash = new_stash();
        let first = stash.fill(&dirt()).unwrap();
        let second = stash.fill(&dirt()).unwrap();
        assert_eq!(card_address(&first), card_address(&second));
    }

    #[test]
    fn filling_different_content_gets_different_addresses() {
        let stash = new_stash();
        let a = stash.fill(&dirt()).unwrap();
        let b = stash.fill(&Item::new("stone", 64, 64)).unwrap();
        assert_ne!(card_address(&a), card_address(&b));
    }

    #[test]
    fn card_for_address_requires_stored_content() {
        let stash = new_stash();
        let card = stash.fill(&dirt()).unwrap();
        let address = card_address(&card).unwrap();

        assert_eq!(stash.card_for_address(&address), Some(card));
        assert!(stash
            .card_for_address(&Address::from_hash([9u8; 32]))
            .is_none());
    }

    // -----------------------------------------------------------------------
    // Defensive open
    // -----------------------------------------------------------------------

    #[test]
    fn open_missing_contents_degrades_to_the_card() {
        let stash = new_stash();
        // A card referencing an address nothing was ever stored under.
        let mut orphan = filled_card(&Address::from_hash([9u8; 32]));
        orphan.quantity = 5;

        let opened = stash.open(&orphan);
        assert!(opened.same_content(&orphan));
        assert_eq!(opened.quantity, 1);
    }

    #[test]
    fn open_raw_item_degrades_to_single_unit() {
        let stash = new_stash();
        let opened = stash.open(&dirt());
        assert!(opened.same_content(&dirt()));
        assert_eq!(opened.quantity, 1);
    }

    // -----------------------------------------------------------------------
    // Depth
    // -----------------------------------------------------------------------

    #[test]
    fn depth_of_raw_and_blank_is_zero() {
        let stash = new_stash();
        assert_eq!(stash.depth(&dirt()), 0);
        assert_eq!(stash.depth(&blank_card()), 0);
    }

    #[test]
    fn depth_counts_nesting_layers() {
        let stash = new_stash();
        let card1 = stash.fill(&dirt()).unwrap();
        assert_eq!(stash.depth(&card1), 1);

        let card2 = stash.fill(&full_stack_of(&card1)).unwrap();
        assert_eq!(stash.depth(&card2), 2);
    }

    #[test]
    fn depth_of_orphan_card_is_one() {
        let stash = new_stash();
        let orphan = filled_card(&Address::from_hash([9u8; 32]));
        // The fallback open yields the card itself, which the guard catches.
        assert_eq!(stash.depth(&orphan), 1);
    }

    #[test]
    fn self_referencing_chain_caps_depth() {
        let stash = new_stash();
        // Hand-craft corruption: a card stored under the very address it
        // references.
        let address = Address::from_hash([7u8; 32]);
        let card = filled_card(&address);
        stash.cache().put(address, card.clone());

        assert_eq!(stash.depth(&card), 1);
    }

    // -----------------------------------------------------------------------
    // Eligibility
    // -----------------------------------------------------------------------

    #[test]
    fn partial_stacks_are_not_fillable() {
        let stash = new_stash();
        let partial = Item::new("dirt", 63, 64);
        assert!(!stash.is_fillable(&partial));
        assert!(stash.deny_reason(&partial, false).is_none());
    }

    #[test]
    fn empty_stacks_are_never_fillable() {
        let stash = new_stash();
        let empty = Item::new("dirt", 0, 64);
        assert!(stash.deny_reason(&empty, false).is_some());
    }

    #[test]
    fn policy_denial_blocks_fill() {
        let store = Arc::new(InMemoryObjectStore::new());
        let cache = Arc::new(BoundedCache::new(store, CacheConfig::default()));
        let policy = Arc::new(StandardPolicy::new().deny_kind("ledger"));
        let stash = Stash::with_policy(cache, policy);

        let err = stash.fill(&Item::new("ledger", 1, 1)).unwrap_err();
        assert!(matches!(err, FillError::Ineligible(_)));
    }

    #[test]
    fn fill_at_depth_limit_is_rejected() {
        let stash = new_stash();
        let card1 = stash.fill(&dirt()).unwrap();
        let card2 = stash.fill(&full_stack_of(&card1)).unwrap();
        assert_eq!(stash.depth(&card2), 2);

        let err = stash.fill(&full_stack_of(&card2)).unwrap_err();
        assert!(matches!(err, FillError::Ineligible(_)));
    }

    #[test]
    fn nested_addresses_differ_per_layer() {
        let stash = new_stash();
        let card1 = stash.fill(&dirt()).unwrap();
        let card2 = stash.fill(&full_stack_of(&card1)).unwrap();
        assert_ne!(card_address(&card1), card_address(&card2));

        // Opening unwinds exactly one layer at a time.
        let once = stash.open(&card2);
        assert!(once.same_content(&card1));
        assert_eq!(stash.open(&once), dirt());
    }

    #[test]
    fn fill_unchecked_skips_the_gate() {
        let stash = new_stash();
        let partial = Item::new("dirt", 3, 64);
        let card = stash.fill_unchecked(&partial).unwrap();
        assert_eq!(stash.open(&card), partial);
    }

    // -----------------------------------------------------------------------
    // Keep marker
    // -----------------------------------------------------------------------

    #[test]
    fn mark_keep_applies_to_filled_cards_only() {
        let stash = new_stash();
        let mut card = stash.fill(&dirt()).unwrap();
        assert!(mark_keep(&mut card));
        assert!(card.has_tag(TAG_KEEP));

        let mut blank = blank_card();
        assert!(!mark_keep(&mut blank));
        let mut raw = dirt();
        assert!(!mark_keep(&mut raw));
    }

    // -----------------------------------------------------------------------
    // Summaries
    // -----------------------------------------------------------------------

    #[test]
    fn summary_of_single_layer_card() {
        let stash = new_stash();
        let card = stash.fill(&dirt()).unwrap();
        let summary = stash.summary(&card).unwrap();

        assert_eq!(summary.root, dirt());
        assert_eq!(summary.total_quantity, 64);
        assert_eq!(Some(summary.address), card_address(&card));
    }

    #[test]
    fn summary_multiplies_across_layers() {
        let stash = new_stash();
        let card1 = stash.fill(&dirt()).unwrap();
        let card2 = stash.fill(&full_stack_of(&card1)).unwrap();

        // card2 (x1) -> 64 cards -> each holding 64 dirt.
        let summary = stash.summary(&card2).unwrap();
        assert!(summary.root.same_content(&dirt()));
        assert_eq!(summary.total_quantity, 64 * 64);
    }

    #[test]
    fn summary_counts_the_outer_stack() {
        let stash = new_stash();
        let mut cards = stash.fill(&dirt()).unwrap();
        cards.quantity = 3;

        let summary = stash.summary(&cards).unwrap();
        assert_eq!(summary.total_quantity, 3 * 64);
    }

    #[test]
    fn summary_of_non_card_is_none() {
        let stash = new_stash();
        assert!(stash.summary(&dirt()).is_none());
        assert!(stash.summary(&blank_card()).is_none());
    }

    #[test]
    fn summary_of_orphan_card_falls_back_to_itself() {
        let stash = new_stash();
        let orphan = filled_card(&Address::from_hash([9u8; 32]));
        let summary = stash.summary(&orphan).unwrap();
        assert!(summary.root.same_content(&orphan));
        assert_eq!(summary.total_quantity, 1);
    }

    // -----------------------------------------------------------------------
    // The full story: wrap, nest, hit the ceiling
    // -----------------------------------------------------------------------

    #[test]
    fn nesting_story_end_to_end() {
        let stash = new_stash();

        // Fresh store: wrap a full stack of dirt.
        let card1 = stash.fill(&dirt()).unwrap();
        let a1 = card_address(&card1).unwrap();
        assert_eq!(stash.open(&card1), dirt());

        // Wrap a full stack of those cards: new address, depth 2.
        let card2 = stash.fill(&full_stack_of(&card1)).unwrap();
        let a2 = card_address(&card2).unwrap();
        assert_ne!(a1, a2);
        assert_eq!(stash.depth(&card2), 2);

        // A third layer is past the nesting limit.
        assert!(!stash.is_fillable(&full_stack_of(&card2)));
        assert!(stash.fill(&full_stack_of(&card2)).is_err());
    }
}
