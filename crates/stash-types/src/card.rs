//! Card tags and classification.
//!
//! A card is an ordinary [`Item`] of the [`CARD_KIND`] kind. Its state lives
//! in tags: a blank card carries [`TAG_BLANK`], a filled card carries
//! [`TAG_ADDRESS`] with the base-36 address of its stored contents. The two
//! markers are mutually exclusive by construction ([`filled_card`] swaps one
//! for the other). [`TAG_KEEP`] opts a filled card out of hash migration.

use crate::address::Address;
use crate::item::Item;

/// Item kind shared by all cards.
pub const CARD_KIND: &str = "card";
/// Cards stack like any other light item.
pub const CARD_MAX_STACK: u32 = 64;

/// Marker tag on a blank card.
pub const TAG_BLANK: &str = "card:blank";
/// Address tag on a filled card; the value is the base-36 address.
pub const TAG_ADDRESS: &str = "card:address";
/// Migration opt-out marker on a filled card.
pub const TAG_KEEP: &str = "card:keep";

/// Closed classification of an item, resolved once per object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardKind {
    /// Not a card, or a card with unusable markers.
    Raw,
    /// A blank card, eligible to be filled.
    Blank,
    /// A filled card referencing stored contents.
    Filled(Address),
}

/// Classify an item as raw content, a blank card, or a filled card.
///
/// A card-kind item whose address tag does not parse classifies as `Raw`:
/// a mangled card is inert rather than an error.
pub fn classify(item: &Item) -> CardKind {
    if item.kind != CARD_KIND {
        return CardKind::Raw;
    }
    if let Some(raw) = item.tag(TAG_ADDRESS) {
        return match Address::from_base36(raw) {
            Ok(address) => CardKind::Filled(address),
            Err(_) => CardKind::Raw,
        };
    }
    if item.has_tag(TAG_BLANK) {
        return CardKind::Blank;
    }
    CardKind::Raw
}

/// Whether the item is a blank card.
pub fn is_blank_card(item: &Item) -> bool {
    classify(item) == CardKind::Blank
}

/// Whether the item is a filled card.
pub fn is_filled_card(item: &Item) -> bool {
    matches!(classify(item), CardKind::Filled(_))
}

/// The address carried by a filled card, if any.
pub fn card_address(item: &Item) -> Option<Address> {
    match classify(item) {
        CardKind::Filled(address) => Some(address),
        _ => None,
    }
}

/// Mint a single blank card.
pub fn blank_card() -> Item {
    Item::new(CARD_KIND, 1, CARD_MAX_STACK).with_tag(TAG_BLANK, "1")
}

/// Mint a single filled card referencing `address`.
///
/// Starts from a blank card and swaps the blank marker for the address tag,
/// so blank and filled cards only ever differ in those two tags.
pub fn filled_card(address: &Address) -> Item {
    let mut card = blank_card();
    card.remove_tag(TAG_BLANK);
    card.set_tag(TAG_ADDRESS, address.to_base36());
    card
}
