//! Post loader - fetches single posts and the list of pre-rendered paths

use super::PostDetail;
use crate::error::{BlogError, Result};
use crate::source::{Query, SharedSource};

/// Loads posts of one document type from a content source
#[derive(Clone)]
pub struct PostLoader {
    source: SharedSource,
    document_type: String,
}

impl PostLoader {
    /// Create a new post loader
    pub fn new(source: SharedSource, document_type: &str) -> Self {
        Self {
            source,
            document_type: document_type.to_string(),
        }
    }

    /// Load the full post identified by `uid`
    pub async fn load(&self, uid: &str) -> Result<PostDetail> {
        let raw = self
            .source
            .get_by_uid(&self.document_type, uid)
            .await?
            .ok_or_else(|| BlogError::NotFound(uid.to_string()))?;

        tracing::debug!("Loaded post {}", uid);
        Ok(PostDetail::from(raw))
    }

    /// Uids of the first `count` posts, the ones rendered ahead of time
    pub async fn static_paths(&self, count: usize) -> Result<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let query = Query::new(&self.document_type, count).fields(&["uid"]);
        let page = self.source.query(&query).await?;

        Ok(page
            .results
            .into_iter()
            .filter_map(|post| post.uid)
            .take(count)
            .collect())
    }
}
