use std::path::Path;

use anyhow::Context;

use stash_types::VecSlots;

/// Load an inventory file.
pub fn load(path: &Path) -> anyhow::Result<VecSlots> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading inventory {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing inventory {}", path.display()))
}

/// Write an inventory file.
pub fn save(path: &Path, slots: &VecSlots) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(slots).context("encoding inventory")?;
    std::fs::write(path, text).with_context(|| format!("writing inventory {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_types::Item;

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.json");

        let mut slots = VecSlots::new(4);
        slots.set(2, Some(Item::new("dirt", 64, 64)));
        save(&path, &slots).unwrap();

        assert_eq!(load(&path).unwrap(), slots);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.json")).is_err());
    }
}
