use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use stash_codec::{decode_item, encode_item};
use stash_types::{Address, Item};

use crate::error::StoreResult;
use crate::traits::ObjectStore;

/// File extension for stored stacks.
const STACK_EXT: &str = "stack";

/// Filesystem-backed object store: one `<address>.stack` file per stack.
///
/// The data directory is created lazily on first write. Writes are
/// check-then-write; the race where two writers create the same file is
/// benign because both hold identical content.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`. The directory is not created until
    /// the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data directory backing this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, address: &Address) -> PathBuf {
        self.root.join(format!("{address}.{STACK_EXT}"))
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, address: &Address, item: &Item) -> StoreResult<()> {
        let path = self.object_path(address);
        if path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.root)?;
        let bytes = encode_item(item)?;
        fs::write(&path, bytes)?;
        debug!(address = %address.short(), kind = %item.kind, "stored stack");
        Ok(())
    }

    fn get(&self, address: &Address) -> StoreResult<Option<Item>> {
        match fs::read(self.object_path(address)) {
            Ok(bytes) => Ok(Some(decode_item(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, address: &Address) -> StoreResult<bool> {
        Ok(self.object_path(address).exists())
    }
}

impl std::fmt::Debug for FsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsObjectStore")
            .field("root", &self.root)
            .finish()
    }
}
