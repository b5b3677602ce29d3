//! In-memory content source
//!
//! Pages are addressed by `memory://<type>?page=N&pageSize=M` cursors so
//! that they round-trip through [`ContentSource::fetch_page`] exactly like
//! the cursor URLs of the real API.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{ContentSource, Query};
use crate::content::{RawPost, ResultsPage};
use crate::error::{BlogError, Result};

const SCHEME: &str = "memory://";

#[derive(Debug, Default)]
pub struct MemorySource {
    documents: Vec<RawPost>,
    requests: AtomicUsize,
    offline: AtomicBool,
}

impl MemorySource {
    pub fn new(documents: Vec<RawPost>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    /// Load documents from a JSON file holding either an array of documents
    /// or a search response with a `results` array
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let documents = match value {
            serde_json::Value::Object(mut map) if map.contains_key("results") => {
                serde_json::from_value(map.remove("results").unwrap_or_default())?
            }
            other => serde_json::from_value(other)?,
        };
        let source = Self::new(documents);
        tracing::debug!(
            "Loaded {} documents from {:?}",
            source.documents.len(),
            path.as_ref()
        );
        Ok(source)
    }

    /// Number of calls served so far, failed ones included
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Make every following call fail with a request error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn begin_request(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(BlogError::Request("content source is offline".to_string()));
        }
        Ok(())
    }

    fn page(&self, document_type: &str, page: u32, page_size: usize) -> Result<ResultsPage> {
        let matching: Vec<&RawPost> = self
            .documents
            .iter()
            .filter(|d| d.doc_type.as_deref().unwrap_or(document_type) == document_type)
            .collect();

        let page_size = page_size.max(1);
        let page = page.max(1);
        let total = matching.len();
        let total_pages = u32::try_from(total.div_ceil(page_size)).unwrap_or(u32::MAX);
        let start = (page as usize - 1)
            .checked_mul(page_size)
            .ok_or_else(|| BlogError::Request(format!("page {} is out of range", page)))?;

        let results = matching
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        let cursor = |p: u32| format!("{}{}?page={}&pageSize={}", SCHEME, document_type, p, page_size);

        Ok(ResultsPage {
            page,
            results_per_page: Some(page_size),
            total_results_size: Some(total),
            total_pages: Some(total_pages),
            next_page: (page < total_pages).then(|| cursor(page + 1)),
            prev_page: (page > 1).then(|| cursor(page - 1)),
            results,
        })
    }
}

/// Split a `memory://` cursor into (type, page, page size)
fn parse_cursor(url: &str) -> Option<(String, u32, usize)> {
    let rest = url.strip_prefix(SCHEME)?;
    let (document_type, query) = rest.split_once('?')?;

    let mut page = None;
    let mut page_size = None;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("page", v)) => page = v.parse().ok(),
            Some(("pageSize", v)) => page_size = v.parse().ok(),
            _ => {}
        }
    }

    Some((document_type.to_string(), page?, page_size?))
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query(&self, query: &Query) -> Result<ResultsPage> {
        self.begin_request()?;
        self.page(&query.document_type, 1, query.page_size)
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawPost>> {
        self.begin_request()?;
        Ok(self
            .documents
            .iter()
            .find(|d| {
                d.uid.as_deref() == Some(uid)
                    && d.doc_type.as_deref().unwrap_or(document_type) == document_type
            })
            .cloned())
    }

    async fn fetch_page(&self, url: &str) -> Result<ResultsPage> {
        self.begin_request()?;
        let (document_type, page, page_size) = parse_cursor(url)
            .ok_or_else(|| BlogError::Request(format!("cannot fetch {:?}", url)))?;
        self.page(&document_type, page, page_size)
    }

    fn accepts_cursor(&self, url: &str) -> bool {
        url.starts_with(SCHEME)
    }
}
