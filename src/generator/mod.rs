//! Generator module - renders the blog pages using built-in Tera templates

use std::fs;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::cache::{self, CacheDb, Freshness};
use crate::content::{PostDetail, PostLoader};
use crate::error::Result;
use crate::helpers::{encode_query_value, more_posts_path, post_path, truncate, url_for};
use crate::pagination::ListViewState;
use crate::richtext;
use crate::source::{Query, SharedSource};
use crate::templates::TemplateRenderer;
use crate::Blog;

/// Route of the home page
pub const INDEX_ROUTE: &str = "/";

/// Seconds between reloads of the loading placeholder
const LOADING_REFRESH_SECS: u64 = 1;

/// Route of a post page
pub fn post_route(uid: &str) -> String {
    format!("/{}", post_path(uid))
}

/// Output file of a route, relative to the public directory
pub fn route_output_path(route: &str) -> String {
    format!("{}index.html", route.trim_start_matches('/'))
}

/// What a `generate` run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub rendered: Vec<String>,
    pub skipped: Vec<String>,
    pub missing: Vec<String>,
}

/// Renders pages from CMS content
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    source: SharedSource,
    loader: PostLoader,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, source: SharedSource) -> Result<Self> {
        let renderer = TemplateRenderer::new(&blog.config)?;
        let loader = PostLoader::new(source.clone(), &blog.config.prismic.document_type);

        Ok(Self {
            blog: blog.clone(),
            renderer,
            source,
            loader,
        })
    }

    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    pub fn loader(&self) -> &PostLoader {
        &self.loader
    }

    /// First page of the home page list
    pub async fn first_page(&self) -> Result<ListViewState> {
        let prismic = &self.blog.config.prismic;
        let query = Query::post_summaries(&prismic.document_type, prismic.page_size);
        let page = self.source.query(&query).await?;
        Ok(ListViewState::from_first_page(page))
    }

    /// Link of the JSON endpoint serving the page after `state`
    pub fn more_api_path(&self, state: &ListViewState) -> Option<String> {
        state.next_page.as_ref().map(|cursor| {
            format!(
                "{}?cursor={}&page={}",
                url_for(&self.blog.config, "/api/posts"),
                encode_query_value(cursor),
                state.current_page + 1
            )
        })
    }

    /// Render the home page for a list state
    pub fn render_index(&self, state: &ListViewState) -> Result<String> {
        let mut context = self.renderer.base_context();
        context.insert("posts", &state.posts);
        context.insert("next_page", &state.next_page);
        context.insert(
            "more_href",
            &more_posts_path(&self.blog.config, state.current_page + 1),
        );
        context.insert("more_api", &self.more_api_path(state).unwrap_or_default());
        self.renderer.render("index.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let reading_time =
            crate::content::reading_time(post, self.blog.config.words_per_minute);

        let summary = post
            .data
            .content
            .first()
            .map(|section| truncate(&richtext::as_text(&section.body), 160, Some("…")))
            .unwrap_or_default();

        let mut context = self.renderer.base_context();
        context.insert("post", post);
        context.insert("reading_time", &reading_time);
        context.insert("summary", &summary);
        self.renderer.render("post.html", &context)
    }

    /// Placeholder shown while a post is fetched in the background
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.renderer.base_context();
        context.insert("refresh_secs", &LOADING_REFRESH_SECS);
        self.renderer.render("loading.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.renderer
            .render("not_found.html", &self.renderer.base_context())
    }

    /// Fetch and render the home page
    pub async fn build_index(&self) -> Result<String> {
        let state = self.first_page().await?;
        tracing::debug!("Home page with {} posts", state.posts.len());
        self.render_index(&state)
    }

    /// Load and render one post
    pub async fn build_post(&self, uid: &str) -> Result<String> {
        let post = self.loader.load(uid).await?;
        self.render_post(&post)
    }

    /// Write a rendered route below the public directory
    pub fn write_page(&self, route: &str, html: &str) -> Result<String> {
        let relative = route_output_path(route);
        let output_path = self.blog.public_dir.join(&relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(relative)
    }

    /// Path of the file written for a route
    pub fn page_file(&self, route: &str) -> PathBuf {
        self.blog.public_dir.join(route_output_path(route))
    }

    /// Remove the file of a route whose document is gone
    pub fn remove_page(&self, route: &str) -> Result<()> {
        let path = self.page_file(route);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::info!("Removed: {:?}", path);
        }
        Ok(())
    }

    /// Generate the home page, the first post pages and the 404 page.
    ///
    /// Pages still fresh in the cache are skipped unless `force` is set.
    pub async fn generate(&self, cache: &mut CacheDb, force: bool) -> Result<GenerateReport> {
        let now = cache::now_secs();
        let revalidate = self.blog.config.revalidate;
        let mut report = GenerateReport::default();

        fs::create_dir_all(&self.blog.public_dir)?;
        self.copy_static_assets()?;

        let is_due = |cache: &CacheDb, route: &str| {
            force
                || cache.freshness(route, now, revalidate) != Freshness::Fresh
                || !self.page_file(route).exists()
        };

        if is_due(&*cache, INDEX_ROUTE) {
            let html = self.build_index().await?;
            let output = self.write_page(INDEX_ROUTE, &html)?;
            cache.record(INDEX_ROUTE, &output, &html, now);
            report.rendered.push(INDEX_ROUTE.to_string());
        } else {
            report.skipped.push(INDEX_ROUTE.to_string());
        }

        let uids = self
            .loader
            .static_paths(self.blog.config.prismic.static_paths)
            .await?;

        for uid in uids {
            let route = post_route(&uid);
            if !is_due(&*cache, &route) {
                report.skipped.push(route);
                continue;
            }

            match self.build_post(&uid).await {
                Ok(html) => {
                    let output = self.write_page(&route, &html)?;
                    cache.record(&route, &output, &html, now);
                    report.rendered.push(route);
                }
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Skipping {}: {}", uid, e);
                    report.missing.push(route);
                }
                Err(e) => return Err(e),
            }
        }

        let not_found = self.render_not_found()?;
        fs::write(self.blog.public_dir.join("404.html"), not_found)?;

        Ok(report)
    }

    /// Copy static assets (css, images, etc.) to public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let Ok(relative) = path.strip_prefix(static_dir) else {
                continue;
            };
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
        }

        Ok(())
    }
}
