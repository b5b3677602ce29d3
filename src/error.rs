//! Error types shared by the content client, loaders and renderers

use thiserror::Error;

/// Errors surfaced to the rendering layer
#[derive(Error, Debug)]
pub enum BlogError {
    /// Network failure, non-success status or undecodable body
    #[error("Request failed: {0}")]
    Request(String),

    /// No document matches the requested uid
    #[error("Post not found: {0}")]
    NotFound(String),

    /// A publication timestamp that cannot be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlogError {
    /// Whether this error means the document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogError::NotFound(_))
    }
}

impl From<reqwest::Error> for BlogError {
    fn from(err: reqwest::Error) -> Self {
        BlogError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for BlogError {
    fn from(err: serde_json::Error) -> Self {
        BlogError::Request(format!("invalid JSON body: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
