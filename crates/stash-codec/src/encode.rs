use std::collections::BTreeMap;

use serde::Serialize;

use stash_types::Item;

use crate::CodecError;

/// Borrowing view of an item's content fields, in declaration order.
/// Quantity is deliberately absent.
#[derive(Serialize)]
struct ContentView<'a> {
    kind: &'a str,
    max_stack: u32,
    tags: &'a BTreeMap<String, String>,
    data: &'a [u8],
}

/// Canonical content encoding: every field except quantity.
pub fn encode_content(item: &Item) -> Result<Vec<u8>, CodecError> {
    let view = ContentView {
        kind: &item.kind,
        max_stack: item.max_stack,
        tags: &item.tags,
        data: &item.data,
    };
    bincode::serialize(&view).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Storage encoding of the full item, quantity included.
pub fn encode_item(item: &Item) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(item).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decode a storage encoding back into an item.
pub fn decode_item(bytes: &[u8]) -> Result<Item, CodecError> {
    bincode::deserialize(bytes).map_err(|e| CodecError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_encoding_ignores_quantity() {
        let full = Item::new("dirt", 64, 64);
        let single = Item::new("dirt", 1, 64);
        assert_eq!(
            encode_content(&full).unwrap(),
            encode_content(&single).unwrap()
        );
    }

    #[test]
    fn content_encoding_sees_tags_and_data() {
        let plain = Item::new("dirt", 64, 64);
        let tagged = Item::new("dirt", 64, 64).with_tag("quality", "fine");
        let loaded = Item::new("dirt", 64, 64).with_data(vec![1]);
        let plain_bytes = encode_content(&plain).unwrap();
        assert_ne!(plain_bytes, encode_content(&tagged).unwrap());
        assert_ne!(plain_bytes, encode_content(&loaded).unwrap());
    }

    #[test]
    fn storage_encoding_sees_quantity() {
        let full = Item::new("dirt", 64, 64);
        let single = Item::new("dirt", 1, 64);
        assert_ne!(encode_item(&full).unwrap(), encode_item(&single).unwrap());
    }

    #[test]
    fn storage_roundtrip() {
        let item = Item::new("dirt", 48, 64)
            .with_tag("quality", "fine")
            .with_data(vec![9, 8, 7]);
        let bytes = encode_item(&item).unwrap();
        assert_eq!(decode_item(&bytes).unwrap(), item);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_item(&[0xff; 3]).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }
}
