//! Content source - the headless CMS behind the blog
//!
//! Pages and loaders only talk to a [`ContentSource`]. [`PrismicClient`]
//! queries a live Prismic repository over HTTP; [`MemorySource`] serves
//! documents from memory or from a JSON fixture for offline builds and tests.

mod memory;
mod prismic;

use async_trait::async_trait;
use std::sync::Arc;

use crate::content::{RawPost, ResultsPage};
use crate::error::Result;

pub use memory::MemorySource;
pub use prismic::PrismicClient;

/// A paginated search by document type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Custom type to match, e.g. `posts`
    pub document_type: String,
    /// Field selection, e.g. `posts.title`; empty selects every field
    pub fetch: Vec<String>,
    pub page_size: usize,
}

impl Query {
    /// Query a document type with every field selected
    pub fn new(document_type: &str, page_size: usize) -> Self {
        Self {
            document_type: document_type.to_string(),
            fetch: Vec::new(),
            page_size: page_size.max(1),
        }
    }

    /// Select only the given fields of the document type
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fetch = fields
            .iter()
            .map(|f| format!("{}.{}", self.document_type, f))
            .collect();
        self
    }

    /// The home page list: title, subtitle and author only
    pub fn post_summaries(document_type: &str, page_size: usize) -> Self {
        Self::new(document_type, page_size).fields(&["title", "subtitle", "author"])
    }
}

/// Read access to the CMS
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of a search
    async fn query(&self, query: &Query) -> Result<ResultsPage>;

    /// The document of `document_type` whose uid is `uid`, if any
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawPost>>;

    /// Follow a pagination cursor returned by a previous page
    async fn fetch_page(&self, url: &str) -> Result<ResultsPage>;

    /// Whether `url` looks like a cursor this source hands out.
    /// Cursors coming from clients are only followed when this holds.
    fn accepts_cursor(&self, url: &str) -> bool;
}

pub type SharedSource = Arc<dyn ContentSource>;

#[cfg(test)]
pub(crate) use memory::fixtures as memory_fixtures;
