//! Home page list state and the "load more" transition
//!
//! The list starts with the first page rendered by the generator and grows
//! one page at a time by following the cursor returned with each page.
//! Entries are only ever appended.

use serde::Serialize;

use crate::content::{PostSummary, ResultsPage};
use crate::error::{BlogError, Result};
use crate::source::SharedSource;

/// Posts shown so far, the cursor of the next page and the current page index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListViewState {
    pub posts: Vec<PostSummary>,
    pub next_page: Option<String>,
    pub current_page: u32,
}

/// Token for one fetch of the next page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    /// Cursor the fetch was issued for; may be absent on the first page
    pub cursor: Option<String>,
}

/// Result of a "load more" attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was appended; holds the number of new posts
    Appended(usize),
    /// No further pages; nothing was fetched
    Exhausted,
    /// The response answered a cursor that is no longer current
    Stale,
}

impl ListViewState {
    /// State after the first page, which is page 1
    pub fn new(posts: Vec<PostSummary>, next_page: Option<String>) -> Self {
        Self {
            posts,
            next_page,
            current_page: 1,
        }
    }

    /// State built from the first page of a search
    pub fn from_first_page(page: ResultsPage) -> Self {
        let posts = page.results.into_iter().map(PostSummary::from).collect();
        Self::new(posts, page.next_page)
    }

    /// Whether the "load more" link should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// The fetch to issue for the next page, or `None` when the list is
    /// exhausted.
    ///
    /// Only a page other than the first one with no cursor stops the fetch.
    /// On page 1 a missing cursor still yields a fetch, which then fails
    /// because there is nothing to request.
    pub fn next_fetch(&self) -> Option<PendingFetch> {
        if self.current_page != 1 && self.next_page.is_none() {
            return None;
        }
        Some(PendingFetch {
            cursor: self.next_page.clone(),
        })
    }

    /// Apply a fetched page if it answers the current cursor.
    ///
    /// A response for a cursor that has already been consumed is dropped, so
    /// the same page triggered twice is appended once.
    pub fn complete(&mut self, pending: &PendingFetch, page: ResultsPage) -> LoadOutcome {
        if pending.cursor != self.next_page {
            tracing::debug!(
                "Dropping page {} fetched for stale cursor {:?}",
                page.page,
                pending.cursor
            );
            return LoadOutcome::Stale;
        }

        let appended = page.results.len();
        *self = apply_next_page(self, page);
        LoadOutcome::Appended(appended)
    }
}

/// Append a fetched page to the list.
///
/// The new results go after every existing entry; the page's cursor and
/// index replace the held ones.
pub fn apply_next_page(state: &ListViewState, page: ResultsPage) -> ListViewState {
    let mut posts = Vec::with_capacity(state.posts.len() + page.results.len());
    posts.extend(state.posts.iter().cloned());
    posts.extend(page.results.into_iter().map(PostSummary::from));

    ListViewState {
        posts,
        next_page: page.next_page,
        current_page: page.page,
    }
}

/// Drives a [`ListViewState`] against a content source
pub struct ListController {
    state: ListViewState,
    source: SharedSource,
}

impl ListController {
    pub fn new(state: ListViewState, source: SharedSource) -> Self {
        Self { state, source }
    }

    pub fn state(&self) -> &ListViewState {
        &self.state
    }

    pub fn into_state(self) -> ListViewState {
        self.state
    }

    /// Fetch the next page and append it.
    ///
    /// State is only touched after the page was fetched and decoded; a failed
    /// fetch leaves it exactly as it was.
    pub async fn load_more(&mut self) -> Result<LoadOutcome> {
        let Some(pending) = self.state.next_fetch() else {
            return Ok(LoadOutcome::Exhausted);
        };

        let cursor = pending.cursor.as_deref().ok_or_else(|| {
            BlogError::Request("no next page cursor to fetch".to_string())
        })?;

        let page = self.source.fetch_page(cursor).await?;
        let outcome = self.state.complete(&pending, page);
        tracing::debug!(
            "Loaded page {} ({} posts held)",
            self.state.current_page,
            self.state.posts.len()
        );
        Ok(outcome)
    }

    /// Load pages until `pages` pages are held or the list is exhausted
    pub async fn load_pages(&mut self, pages: u32) -> Result<()> {
        while self.state.current_page < pages && self.state.has_more() {
            let before = self.state.current_page;
            match self.load_more().await? {
                LoadOutcome::Appended(_) if self.state.current_page > before => {}
                _ => break,
            }
        }
        Ok(())
    }
}
