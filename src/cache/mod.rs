//! Cache module for page revalidation
//!
//! Every generated page is recorded with the time it was rendered. A page
//! older than the configured revalidate period is stale: it may still be
//! served, but it is rendered again from fresh CMS content. A change of the
//! site config invalidates every entry.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Cache directory name
pub const CACHE_DIR: &str = ".spacetraveling-cache";

/// Cache file name
const CACHE_FILE: &str = ".spacetraveling-cache/db.json";

/// A generated page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix timestamp of the last render
    pub generated_at: u64,
    /// Output path relative to public dir
    pub output_path: String,
    /// Hash of the rendered HTML
    pub content_hash: u64,
}

/// How a route relates to the revalidate period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Missing,
}

/// Record of generated pages, keyed by route (`/`, `/post/<uid>/`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Hash of the site config (changes invalidate every page)
    pub config_hash: u64,
    pub pages: HashMap<String, CacheEntry>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            match serde_json::from_str::<CacheDb>(&content) {
                Ok(cache) if cache.version == Self::VERSION => return cache,
                Ok(_) => tracing::info!("Cache version mismatch, rebuilding cache"),
                Err(e) => tracing::warn!("Ignoring unreadable cache {:?}: {}", cache_path, e),
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        fs::create_dir_all(base_dir.join(CACHE_DIR))?;

        let cache_path = base_dir.join(CACHE_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_path, content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Record a page rendered at `now`; returns whether its HTML changed
    pub fn record(&mut self, route: &str, output_path: &str, html: &str, now: u64) -> bool {
        let content_hash = hash_content(html);
        let changed = self
            .pages
            .get(route)
            .map(|entry| entry.content_hash != content_hash)
            .unwrap_or(true);

        self.pages.insert(
            route.to_string(),
            CacheEntry {
                generated_at: now,
                output_path: output_path.to_string(),
                content_hash,
            },
        );
        changed
    }

    /// Forget a page, e.g. when its document was removed
    pub fn remove(&mut self, route: &str) -> Option<CacheEntry> {
        self.pages.remove(route)
    }

    pub fn freshness(&self, route: &str, now: u64, revalidate: u64) -> Freshness {
        match self.pages.get(route) {
            None => Freshness::Missing,
            Some(entry) if now.saturating_sub(entry.generated_at) >= revalidate => {
                Freshness::Stale
            }
            Some(_) => Freshness::Fresh,
        }
    }

    /// Drop every entry if the config hash differs from the recorded one.
    /// Returns whether the cache was invalidated.
    pub fn sync_config(&mut self, config_hash: u64) -> bool {
        if self.config_hash == config_hash {
            return false;
        }
        let invalidated = self.config_hash != 0 && !self.pages.is_empty();
        if invalidated {
            tracing::info!("Config changed, every page will be rendered again");
        }
        self.pages.clear();
        self.config_hash = config_hash;
        invalidated
    }
}

/// Calculate a hash for file content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Calculate hash for site config; a missing file hashes to 0
pub fn hash_config(config_path: &Path) -> Result<u64> {
    if !config_path.exists() {
        return Ok(0);
    }
    let content = fs::read_to_string(config_path)?;
    Ok(hash_content(&content))
}

/// Current time as unix timestamp
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
