//! Prismic REST API v2 client

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;

use super::{ContentSource, Query};
use crate::config::PrismicConfig;
use crate::content::{RawPost, ResultsPage};
use crate::error::{BlogError, Result};

/// API descriptor returned by the entry point
#[derive(Debug, Deserialize)]
struct ApiDescriptor {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

#[derive(Clone)]
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    client: Client,
}

impl PrismicClient {
    pub fn new(config: &PrismicConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(BlogError::Request(
                "no Prismic endpoint configured (set prismic.endpoint or PRISMIC_API_ENDPOINT)"
                    .to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current master ref; it changes with every publication
    async fn master_ref(&self) -> Result<String> {
        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token)]);
        }

        let api: ApiDescriptor = request.send().await?.error_for_status()?.json().await?;
        api.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| BlogError::Request("API descriptor has no master ref".to_string()))
    }

    async fn search(&self, predicate: &str, fetch: &[String], page_size: usize) -> Result<ResultsPage> {
        let master_ref = self.master_ref().await?;

        let mut params: Vec<(&str, String)> = vec![
            ("ref", master_ref),
            ("q", format!("[{}]", predicate)),
            ("pageSize", page_size.to_string()),
        ];
        if !fetch.is_empty() {
            params.push(("fetch", fetch.join(",")));
        }
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }

        let url = format!("{}/documents/search", self.endpoint);
        tracing::debug!("Prismic search {} {}", url, predicate);

        let page = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .json::<ResultsPage>()
            .await?;
        Ok(page)
    }
}

/// Host of a repository URL with the `cdn` label removed, so that
/// `blog.prismic.io` and `blog.cdn.prismic.io` compare equal
fn repository_host(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    Some(host.replacen(".cdn.", ".", 1))
}

/// `[at(path, "value")]` with the value quoted for the query language
fn at_predicate(path: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[at({}, \"{}\")]", path, escaped)
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query(&self, query: &Query) -> Result<ResultsPage> {
        let predicate = at_predicate("document.type", &query.document_type);
        self.search(&predicate, &query.fetch, query.page_size).await
    }

    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<RawPost>> {
        let predicate = at_predicate(&format!("my.{}.uid", document_type), uid);
        let page = self.search(&predicate, &[], 1).await?;
        Ok(page.results.into_iter().next())
    }

    async fn fetch_page(&self, url: &str) -> Result<ResultsPage> {
        tracing::debug!("Fetching next page {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn accepts_cursor(&self, url: &str) -> bool {
        let (Ok(endpoint), Ok(cursor)) = (Url::parse(&self.endpoint), Url::parse(url)) else {
            return false;
        };
        if !matches!(cursor.scheme(), "http" | "https") || cursor.port() != endpoint.port() {
            return false;
        }
        let same_repository = repository_host(&cursor).is_some()
            && repository_host(&cursor) == repository_host(&endpoint);
        same_repository && cursor.path().starts_with(endpoint.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{ListController, ListViewState};
    use crate::source::memory_fixtures as fixtures;
    use std::sync::Arc;

    fn client(endpoint: &str) -> PrismicClient {
        PrismicClient::new(&PrismicConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    /// Local endpoint answering every search with an HTML maintenance page
    async fn html_endpoint() -> String {
        let app = axum::Router::new().route(
            "/api/v2/documents/search",
            axum::routing::get(|| async { axum::response::Html("<html>maintenance</html>") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v2", addr)
    }

    #[tokio::test]
    async fn test_non_json_page_is_a_request_error() {
        let endpoint = html_endpoint().await;
        let client = client(&endpoint);
        let cursor = format!("{}/documents/search?page=2&pageSize=1", endpoint);
        assert!(client.accepts_cursor(&cursor));

        assert!(matches!(
            client.fetch_page(&cursor).await,
            Err(BlogError::Request(_))
        ));

        let state = ListViewState::new(
            vec![fixtures::post("post-1", "2021-03-25T00:00:00+0000").into()],
            Some(cursor),
        );
        let mut controller = ListController::new(state.clone(), Arc::new(client));
        assert!(matches!(
            controller.load_more().await,
            Err(BlogError::Request(_))
        ));
        assert_eq!(controller.state(), &state);
    }

    #[test]
    fn test_accepts_cursors_of_the_repository() {
        let client = client("https://blog.prismic.io/api/v2");
        assert!(client.accepts_cursor(
            "https://blog.cdn.prismic.io/api/v2/documents/search?ref=X&page=2"
        ));
        assert!(client.accepts_cursor(
            "https://blog.prismic.io/api/v2/documents/search?page=2"
        ));
        assert!(!client.accepts_cursor("https://other.cdn.prismic.io/api/v2/documents/search"));
        assert!(!client.accepts_cursor("https://blog.cdn.prismic.io/admin"));
        assert!(!client.accepts_cursor("http://internal/admin"));
        assert!(!client.accepts_cursor("memory://posts?page=2&pageSize=1"));
        assert!(!client.accepts_cursor("not a url"));
    }

    #[test]
    fn test_at_predicate() {
        assert_eq!(
            at_predicate("document.type", "posts"),
            r#"[at(document.type, "posts")]"#
        );
        assert_eq!(
            at_predicate("my.posts.uid", r#"a"b"#),
            r#"[at(my.posts.uid, "a\"b")]"#
        );
    }

    #[test]
    fn test_requires_endpoint() {
        let config = PrismicConfig::default();
        assert!(matches!(
            PrismicClient::new(&config),
            Err(BlogError::Request(_))
        ));
    }

    #[test]
    fn test_trims_endpoint() {
        let config = PrismicConfig {
            endpoint: "https://blog.cdn.prismic.io/api/v2/".to_string(),
            ..Default::default()
        };
        let client = PrismicClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "https://blog.cdn.prismic.io/api/v2");
    }

    #[test]
    fn test_parse_api_descriptor() {
        let api: ApiDescriptor = serde_json::from_str(
            r#"{ "refs": [
                { "id": "preview", "ref": "XyZ", "label": "Preview" },
                { "id": "master", "ref": "YF0abc", "label": "Master", "isMasterRef": true }
            ] }"#,
        )
        .unwrap();
        let master = api.refs.into_iter().find(|r| r.is_master_ref).unwrap();
        assert_eq!(master.reference, "YF0abc");
    }
}
