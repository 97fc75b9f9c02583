use std::collections::BTreeSet;

use stash_types::item::TAG_CONTAINER;
use stash_types::Item;

/// Structural eligibility rules, independent of nesting depth.
///
/// The policy answers one question: is there a reason this item may never
/// be stored in a card, regardless of how it is stacked or nested? Depth
/// and stack-size rules stay in [`Stash`](crate::Stash); the policy covers
/// domain knowledge about item kinds.
pub trait FillPolicy: Send + Sync {
    /// The reason `item` may never be stored, or `None` if it is allowed.
    fn deny(&self, item: &Item) -> Option<String>;
}

/// Default policy: a configurable set of denied kinds, plus the rule that
/// containers are never storable.
#[derive(Debug, Default)]
pub struct StandardPolicy {
    denied_kinds: BTreeSet<String>,
}

impl StandardPolicy {
    /// Policy with no denied kinds (containers are still denied).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: deny a kind outright.
    pub fn deny_kind(mut self, kind: impl Into<String>) -> Self {
        self.denied_kinds.insert(kind.into());
        self
    }
}

impl FillPolicy for StandardPolicy {
    fn deny(&self, item: &Item) -> Option<String> {
        if self.denied_kinds.contains(&item.kind) {
            return Some(format!("kind {:?} is not storable", item.kind));
        }
        if item.has_tag(TAG_CONTAINER) {
            return Some("containers are not storable".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_allows_plain_items() {
        let policy = StandardPolicy::new();
        assert!(policy.deny(&Item::new("dirt", 64, 64)).is_none());
    }

    #[test]
    fn denied_kind_is_rejected() {
        let policy = StandardPolicy::new().deny_kind("ledger");
        assert!(policy.deny(&Item::new("ledger", 1, 1)).is_some());
        assert!(policy.deny(&Item::new("dirt", 64, 64)).is_none());
    }

    #[test]
    fn containers_are_rejected() {
        let policy = StandardPolicy::new();
        let chest = Item::new("chest", 1, 64).with_tag(TAG_CONTAINER, "1");
        assert!(policy.deny(&chest).is_some());
    }
}
