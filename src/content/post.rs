//! Post models as delivered by the CMS and as held by the pages

use serde::{Deserialize, Deserializer, Serialize};

use crate::richtext::TextBlock;

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A document as returned by the content API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPost {
    /// Internal document id
    #[serde(default)]
    pub id: Option<String>,

    /// Unique, URL-friendly identifier
    #[serde(default)]
    pub uid: Option<String>,

    /// Custom type name ("posts")
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,

    /// ISO timestamp of the first publication
    #[serde(default)]
    pub first_publication_date: Option<String>,

    /// ISO timestamp of the latest publication
    #[serde(default)]
    pub last_publication_date: Option<String>,

    /// Document fields; only the selected ones are present on list queries
    #[serde(default)]
    pub data: RawPostData,
}

/// Fields of a `posts` document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPostData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub banner: Banner,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

/// Image field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    #[serde(default)]
    pub alt: Option<String>,
}

/// One group of the post body: an optional heading followed by rich text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default)]
    pub heading: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<TextBlock>,
}

/// Entry of the home page list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: Option<String>,

    /// Raw ISO timestamp, formatted only when rendered
    pub first_publication_date: Option<String>,

    pub data: SummaryData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl From<RawPost> for PostSummary {
    fn from(raw: RawPost) -> Self {
        Self {
            uid: raw.uid,
            first_publication_date: raw.first_publication_date,
            data: SummaryData {
                title: raw.data.title,
                subtitle: raw.data.subtitle,
                author: raw.data.author,
            },
        }
    }
}

/// Full post shown on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: Option<String>,

    /// Raw ISO timestamp, formatted only when rendered
    pub first_publication_date: Option<String>,

    pub data: DetailData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailData {
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<ContentSection>,
}

impl From<RawPost> for PostDetail {
    fn from(raw: RawPost) -> Self {
        Self {
            uid: raw.uid,
            first_publication_date: raw.first_publication_date,
            data: DetailData {
                title: raw.data.title,
                banner: raw.data.banner,
                author: raw.data.author,
                content: raw.data.content,
            },
        }
    }
}

/// One page of a paginated search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsPage {
    /// 1-based index of this page
    pub page: u32,

    #[serde(default)]
    pub results_per_page: Option<usize>,

    #[serde(default)]
    pub total_results_size: Option<usize>,

    #[serde(default)]
    pub total_pages: Option<u32>,

    /// Cursor URL of the following page, `None` on the last one
    #[serde(default)]
    pub next_page: Option<String>,

    #[serde(default)]
    pub prev_page: Option<String>,

    pub results: Vec<RawPost>,
}
