use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use stash_cache::CacheConfig;

/// On-disk configuration, written by `stash init`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StashConfig {
    /// Directory holding one file per stored stack.
    pub data_dir: PathBuf,
    pub cache: CacheSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum stacks held in memory.
    pub capacity: usize,
    /// Idle minutes before a cached stack is evicted.
    pub idle_minutes: u64,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("stash-objects"),
            cache: CacheSettings {
                capacity: 500,
                idle_minutes: 30,
            },
        }
    }
}

impl StashConfig {
    /// Load from `path`, falling back to defaults if the file is absent.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Write to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = toml::to_string_pretty(self).context("encoding config")?;
        std::fs::write(path, text).with_context(|| format!("writing config {}", path.display()))
    }

    /// The cache tuning this config describes.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache.capacity,
            idle_expiry: Duration::from_secs(self.cache.idle_minutes * 60),
        }
    }
}
