//! spacetraveling: a blog frontend backed by a Prismic repository
//!
//! Posts are fetched from the CMS and rendered with embedded Tera templates.
//! The home page and the first posts are generated ahead of time; the
//! server renders the rest on demand and keeps every page revalidated.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pagination;
pub mod richtext;
pub mod server;
pub mod source;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use source::{MemorySource, PrismicClient, SharedSource};

/// The blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets copied into the output
    pub static_dir: PathBuf,
    /// Path of `_config.yml`
    pub config_path: PathBuf,
}

impl Blog {
    /// Create a new blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog instance with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        Self {
            public_dir: base_dir.join(&config.public_dir),
            static_dir: base_dir.join(&config.static_dir),
            config_path: base_dir.join("_config.yml"),
            config,
            base_dir,
        }
    }

    /// The content source: the fixture file when one is configured,
    /// the Prismic API otherwise
    pub fn source(&self) -> Result<SharedSource> {
        if let Some(fixture) = &self.config.prismic.fixture {
            let path = self.base_dir.join(fixture);
            tracing::info!("Serving content from fixture {:?}", path);
            return Ok(Arc::new(MemorySource::from_file(path)?));
        }
        Ok(Arc::new(PrismicClient::new(&self.config.prismic)?))
    }

    /// Generate the static pages
    pub async fn generate(&self, force: bool) -> Result<()> {
        commands::generate::run(self, force).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
