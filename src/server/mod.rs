//! HTTP server with on-demand rendering
//!
//! Pages written by `generate` are served from disk while they are fresh.
//! A stale post page is still served, and rendered again in the background.
//! A post that was never rendered gets the loading placeholder while it is
//! fetched; the placeholder refreshes itself until the page exists.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::cache::{self, CacheDb, Freshness};
use crate::content::{PostSummary, ResultsPage};
use crate::error::BlogError;
use crate::generator::{post_route, Generator, INDEX_ROUTE};
use crate::helpers::{format_publication_date, more_posts_path, parse_timezone, post_path, url_for};
use crate::i18n::Locale;
use crate::pagination::{ListController, ListViewState};
use crate::source::ContentSource;
use crate::Blog;

/// Upper bound for `/?pages=N`
const MAX_LIST_PAGES: u32 = 50;

/// Upper bound for remembered not-found routes
const MAX_MISSING_ROUTES: usize = 1024;

/// Server state
pub struct ServerState {
    generator: Generator,
    cache: Mutex<CacheDb>,
    /// Routes with a background load running
    in_flight: Mutex<HashSet<String>>,
    /// Routes whose document was not found, with the time it was noticed
    missing: Mutex<HashMap<String, u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ServerState {
    pub fn new(generator: Generator) -> Self {
        let cache = CacheDb::load(&generator.blog().base_dir);
        Self {
            generator,
            cache: Mutex::new(cache),
            in_flight: Mutex::new(HashSet::new()),
            missing: Mutex::new(HashMap::new()),
        }
    }

    fn blog(&self) -> &Blog {
        self.generator.blog()
    }

    /// Number of background loads still running
    pub fn pending_loads(&self) -> usize {
        lock(&self.in_flight).len()
    }

    fn freshness(&self, route: &str, now: u64) -> Freshness {
        lock(&self.cache).freshness(route, now, self.blog().config.revalidate)
    }

    /// Whether the document behind `route` was reported missing within the
    /// last revalidate period
    fn recently_missing(&self, route: &str, now: u64) -> bool {
        let revalidate = self.blog().config.revalidate;
        let mut missing = lock(&self.missing);
        match missing.get(route) {
            Some(&at) if now.saturating_sub(at) < revalidate => true,
            Some(_) => {
                missing.remove(route);
                false
            }
            None => false,
        }
    }

    async fn read_page(&self, route: &str) -> Option<Html<String>> {
        tokio::fs::read_to_string(self.generator.page_file(route))
            .await
            .ok()
            .map(Html)
    }

    /// Write a rendered page and record it in the cache
    fn store(&self, route: &str, html: &str) -> crate::error::Result<()> {
        let output = self.generator.write_page(route, html)?;
        let now = cache::now_secs();
        let mut db = lock(&self.cache);
        if db.record(route, &output, html, now) {
            tracing::info!("Rendered {}", route);
        }
        if let Err(e) = db.save(&self.blog().base_dir) {
            tracing::warn!("Failed to save cache: {}", e);
        }
        Ok(())
    }

    async fn rebuild_index(&self) -> crate::error::Result<String> {
        let html = self.generator.build_index().await?;
        self.store(INDEX_ROUTE, &html)?;
        Ok(html)
    }

    /// Home page holding the first `pages` pages of posts
    async fn render_pages(&self, pages: u32) -> crate::error::Result<String> {
        let first = self.generator.first_page().await?;
        let mut controller = ListController::new(first, self.generator.source().clone());
        controller.load_pages(pages.min(MAX_LIST_PAGES)).await?;
        self.generator.render_index(controller.state())
    }

    async fn load_post(&self, uid: &str, route: &str) {
        match self.generator.build_post(uid).await {
            Ok(html) => {
                if let Err(e) = self.store(route, &html) {
                    tracing::error!("Failed to write {}: {}", route, e);
                }
                lock(&self.missing).remove(route);
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("{}", e);
                self.remember_missing(route, cache::now_secs());
                let removed = lock(&self.cache).remove(route);
                if removed.is_some() {
                    if let Err(e) = self.generator.remove_page(route) {
                        tracing::warn!("Failed to remove {}: {}", route, e);
                    }
                }
            }
            Err(e) => tracing::warn!("Loading {} failed, retrying on next request: {}", uid, e),
        }
    }

    /// Remember a not-found route, dropping expired entries and, past
    /// [`MAX_MISSING_ROUTES`], the oldest one
    fn remember_missing(&self, route: &str, now: u64) {
        let revalidate = self.blog().config.revalidate;
        let mut missing = lock(&self.missing);
        missing.retain(|_, at| now.saturating_sub(*at) < revalidate);

        if missing.len() >= MAX_MISSING_ROUTES && !missing.contains_key(route) {
            let oldest = missing
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(route, _)| route.clone());
            if let Some(oldest) = oldest {
                missing.remove(&oldest);
            }
        }
        missing.insert(route.to_string(), now);
    }

    fn loading_page(&self) -> Response {
        match self.generator.render_loading() {
            Ok(html) => Html(html).into_response(),
            Err(e) => error_response(e),
        }
    }

    fn not_found_page(&self) -> Response {
        match self.generator.render_not_found() {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => error_response(e),
        }
    }
}

/// Start a background load of a post unless one is already running
fn spawn_post_load(state: Arc<ServerState>, uid: String) {
    let route = post_route(&uid);
    if !lock(&state.in_flight).insert(route.clone()) {
        tracing::debug!("Load of {} already running", route);
        return;
    }

    tokio::spawn(async move {
        state.load_post(&uid, &route).await;
        lock(&state.in_flight).remove(&route);
    });
}

fn error_response(err: BlogError) -> Response {
    tracing::error!("{}", err);
    let status = match err {
        BlogError::Request(_) => StatusCode::BAD_GATEWAY,
        BlogError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string()).into_response()
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = state.blog().public_dir.clone();
    let static_files =
        ServeDir::new(&public_dir).not_found_service(ServeFile::new(public_dir.join("404.html")));

    Router::new()
        .route("/", get(index_handler))
        .route("/post/:uid", get(post_handler))
        .route("/post/:uid/", get(post_handler))
        .route("/api/posts", get(api_posts_handler))
        .route("/health", get(|| async { "OK" }))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let generator = Generator::new(blog, blog.source()?)?;
    let state = Arc::new(ServerState::new(generator));
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct HomeQuery {
    pages: Option<u32>,
}

async fn index_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<HomeQuery>,
) -> Response {
    let pages = query.pages.unwrap_or(1);
    if pages > 1 {
        return match state.render_pages(pages).await {
            Ok(html) => Html(html).into_response(),
            Err(e) => error_response(e),
        };
    }

    if state.freshness(INDEX_ROUTE, cache::now_secs()) == Freshness::Fresh {
        if let Some(page) = state.read_page(INDEX_ROUTE).await {
            return page.into_response();
        }
    }

    match state.rebuild_index().await {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(e),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(uid): Path<String>,
) -> Response {
    let route = post_route(&uid);
    let now = cache::now_secs();

    if state.recently_missing(&route, now) {
        return state.not_found_page();
    }

    match state.freshness(&route, now) {
        Freshness::Fresh => {
            if let Some(page) = state.read_page(&route).await {
                return page.into_response();
            }
        }
        Freshness::Stale => {
            if let Some(page) = state.read_page(&route).await {
                spawn_post_load(state.clone(), uid);
                return page.into_response();
            }
        }
        Freshness::Missing => {}
    }

    spawn_post_load(state.clone(), uid);
    state.loading_page()
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    cursor: String,
}

/// A "load more" page as consumed by the home page script
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiPage {
    pub posts: Vec<ApiPost>,
    pub more_api: Option<String>,
    pub more_href: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiPost {
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub author: String,
}

async fn api_posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ApiQuery>,
) -> Response {
    if !state.generator.source().accepts_cursor(&query.cursor) {
        return (StatusCode::BAD_REQUEST, "Unknown cursor").into_response();
    }

    let page = match state.generator.source().fetch_page(&query.cursor).await {
        Ok(page) => page,
        Err(e) => return error_response(e),
    };

    match api_page(&state, page) {
        Ok(page) => Json(page).into_response(),
        Err(e) => error_response(e),
    }
}

fn api_page(state: &ServerState, page: ResultsPage) -> crate::error::Result<ApiPage> {
    let config = &state.blog().config;
    let locale = Locale::from_tag(&config.language);
    let timezone = parse_timezone(&config.timezone);

    let list = ListViewState {
        posts: page.results.into_iter().map(PostSummary::from).collect(),
        next_page: page.next_page,
        current_page: page.page,
    };

    let posts = list
        .posts
        .iter()
        .map(|post| -> crate::error::Result<ApiPost> {
            let href = match post.uid.as_deref() {
                Some(uid) => url_for(config, &post_path(uid)),
                None => url_for(config, "/"),
            };
            Ok(ApiPost {
                href,
                title: post.data.title.clone(),
                subtitle: post.data.subtitle.clone(),
                date: format_publication_date(
                    post.first_publication_date.as_deref(),
                    &config.date_format,
                    locale,
                    timezone,
                )?,
                author: post.data.author.clone(),
            })
        })
        .collect::<crate::error::Result<Vec<_>>>()?;

    Ok(ApiPage {
        posts,
        more_api: state.generator.more_api_path(&list),
        more_href: list
            .has_more()
            .then(|| more_posts_path(config, list.current_page + 1)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::source::memory_fixtures as fixtures;
    use crate::source::MemorySource;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestServer {
        dir: tempfile::TempDir,
        state: Arc<ServerState>,
        source: Arc<MemorySource>,
    }

    impl TestServer {
        fn new(posts: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let blog = Blog::with_config(dir.path(), SiteConfig::default());
            let source = Arc::new(MemorySource::new(fixtures::posts(posts)));
            let generator = Generator::new(&blog, source.clone()).unwrap();
            let state = Arc::new(ServerState::new(generator));
            Self { dir, state, source }
        }

        async fn get(&self, uri: &str) -> (StatusCode, String) {
            let response = router(self.state.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }

        async fn settle(&self) {
            for _ in 0..200 {
                if self.state.pending_loads() == 0 {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            panic!("background loads did not finish");
        }
    }

    #[tokio::test]
    async fn test_health() {
        let server = TestServer::new(0);
        let (status, body) = server.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn test_missing_post_shows_loading_then_page() {
        let server = TestServer::new(2);

        let (status, body) = server.get("/post/post-2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Carregando..."));

        server.settle().await;
        assert!(server.dir.path().join("public/post/post-2/index.html").exists());

        let requests = server.source.request_count();
        let (status, body) = server.get("/post/post-2/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Title post-2"));
        assert_eq!(server.source.request_count(), requests);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_load() {
        let server = TestServer::new(1);

        server.get("/post/post-1").await;
        server.get("/post/post-1").await;
        server.settle().await;

        assert_eq!(server.source.request_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_post_answers_not_found() {
        let server = TestServer::new(1);

        let (status, _) = server.get("/post/nope").await;
        assert_eq!(status, StatusCode::OK);
        server.settle().await;

        let (status, body) = server.get("/post/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Post não encontrado"));
        assert_eq!(server.source.request_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_routes_expire_and_stay_bounded() {
        let server = TestServer::new(0);
        let revalidate = server.state.blog().config.revalidate;

        server.state.remember_missing("/post/old/", 1);
        server.state.remember_missing("/post/new/", 1 + revalidate);
        assert!(!lock(&server.state.missing).contains_key("/post/old/"));

        let now = 10 * revalidate;
        for i in 0..MAX_MISSING_ROUTES + 100 {
            server.state.remember_missing(&format!("/post/nope-{}/", i), now + i as u64);
        }
        let missing = lock(&server.state.missing);
        assert_eq!(missing.len(), MAX_MISSING_ROUTES);
        assert!(missing.contains_key(&format!("/post/nope-{}/", MAX_MISSING_ROUTES + 99)));
        assert!(!missing.contains_key("/post/nope-0/"));
    }

    #[tokio::test]
    async fn test_unknown_posts_do_not_accumulate() {
        let server = TestServer::new(0);
        for i in 0..20 {
            server.get(&format!("/post/nope-{}", i)).await;
        }
        server.settle().await;
        assert_eq!(lock(&server.state.missing).len(), 20);

        let later = cache::now_secs() + server.state.blog().config.revalidate;
        server.state.remember_missing("/post/late/", later);
        assert_eq!(lock(&server.state.missing).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let server = TestServer::new(1);
        server.source.set_offline(true);

        server.get("/post/post-1").await;
        server.settle().await;

        server.source.set_offline(false);
        let (_, body) = server.get("/post/post-1").await;
        assert!(body.contains("Carregando..."));
        server.settle().await;
        assert_eq!(server.source.request_count(), 2);

        let (_, body) = server.get("/post/post-1").await;
        assert!(body.contains("Title post-1"));
    }

    #[tokio::test]
    async fn test_stale_post_is_served_and_revalidated() {
        let server = TestServer::new(1);
        let route = post_route("post-1");
        let revalidate = server.state.blog().config.revalidate;
        let html = "<p>old</p>";
        let output = server.state.generator.write_page(&route, html).unwrap();
        lock(&server.state.cache).record(&route, &output, html, cache::now_secs() - revalidate - 1);

        let (status, body) = server.get("/post/post-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<p>old</p>");

        server.settle().await;
        let (_, body) = server.get("/post/post-1").await;
        assert!(body.contains("Title post-1"));
    }

    #[tokio::test]
    async fn test_index_is_generated_then_served_from_disk() {
        let server = TestServer::new(3);

        let (status, body) = server.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Title post-1"));
        assert!(!body.contains("Title post-2"));
        assert!(body.contains(r#"href="/?pages=2""#));

        let requests = server.source.request_count();
        let (_, again) = server.get("/").await;
        assert_eq!(again, body);
        assert_eq!(server.source.request_count(), requests);
    }

    #[tokio::test]
    async fn test_index_with_pages() {
        let server = TestServer::new(3);
        let (status, body) = server.get("/?pages=2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Title post-1"));
        assert!(body.contains("Title post-2"));
        assert!(!body.contains("Title post-3"));
        assert!(body.contains(r#"href="/?pages=3""#));
    }

    #[tokio::test]
    async fn test_index_reports_source_failure() {
        let server = TestServer::new(1);
        server.source.set_offline(true);
        let (status, _) = server.get("/").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_api_posts() {
        let server = TestServer::new(3);
        let cursor = crate::helpers::encode_query_value("memory://posts?page=2&pageSize=1");

        let (status, body) = server.get(&format!("/api/posts?cursor={}", cursor)).await;
        assert_eq!(status, StatusCode::OK);

        let page: ApiPage = serde_json::from_str(&body).unwrap();
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].href, "/post/post-2/");
        assert_eq!(page.posts[0].title, "Title post-2");
        assert_eq!(page.posts[0].date, "25 mar 2021");
        assert_eq!(page.more_href.as_deref(), Some("/?pages=3"));
        assert!(page.more_api.unwrap().starts_with("/api/posts?cursor=memory%3A"));
    }

    #[tokio::test]
    async fn test_api_posts_last_page_and_foreign_cursor() {
        let server = TestServer::new(2);
        let cursor = crate::helpers::encode_query_value("memory://posts?page=2&pageSize=1");
        let (_, body) = server.get(&format!("/api/posts?cursor={}", cursor)).await;
        let page: ApiPage = serde_json::from_str(&body).unwrap();
        assert!(page.more_api.is_none());
        assert!(page.more_href.is_none());

        let (status, _) = server
            .get("/api/posts?cursor=http%3A%2F%2Finternal%2Fadmin")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(server.source.request_count(), 1);
    }

    #[tokio::test]
    async fn test_api_posts_huge_cursor_is_rejected_without_panic() {
        let server = TestServer::new(1);
        let (status, _) = server
            .get("/api/posts?cursor=memory%3A%2F%2Fposts%3Fpage%3D4294967295%26pageSize%3D18446744073709551615")
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = server.get("/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_files_and_404() {
        let server = TestServer::new(1);
        let public = server.dir.path().join("public");
        std::fs::create_dir_all(public.join("css")).unwrap();
        std::fs::write(public.join("css/style.css"), "body {}").unwrap();
        std::fs::write(public.join("404.html"), "gone").unwrap();

        let (status, body) = server.get("/css/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body {}");

        let (status, body) = server.get("/nothing/here").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "gone");
    }
}
