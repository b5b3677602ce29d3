//! Generate static files

use anyhow::Result;

use crate::cache::{self, CacheDb};
use crate::generator::Generator;
use crate::Blog;

/// Render the home page and the first posts, reusing pages still fresh
/// in the cache unless `force` is set
pub async fn run(blog: &Blog, force: bool) -> Result<()> {
    let start = std::time::Instant::now();

    let mut cache = CacheDb::load(&blog.base_dir);
    cache.sync_config(cache::hash_config(&blog.config_path)?);

    let generator = Generator::new(blog, blog.source()?)?;
    let report = generator.generate(&mut cache, force).await?;

    for route in &report.missing {
        if cache.remove(route).is_some() {
            generator.remove_page(route)?;
        }
    }

    cache.save(&blog.base_dir)?;

    tracing::info!(
        "Rendered {} pages, {} still fresh",
        report.rendered.len(),
        report.skipped.len()
    );
    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}

/// Clear the cache
pub fn clear_cache(blog: &Blog) -> Result<()> {
    let cache_dir = blog.base_dir.join(cache::CACHE_DIR);
    if cache_dir.exists() {
        std::fs::remove_dir_all(&cache_dir)?;
        tracing::info!("Cache cleared");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;

    fn fixture_blog(dir: &std::path::Path, uids: &[&str]) -> Blog {
        let documents: Vec<serde_json::Value> = uids
            .iter()
            .map(|uid| {
                serde_json::json!({
                    "uid": uid,
                    "type": "posts",
                    "first_publication_date": "2021-03-25T19:25:28+0000",
                    "data": {
                        "title": format!("Title {}", uid),
                        "subtitle": "",
                        "author": "Joseph Oliveira",
                        "content": [{ "heading": "Intro", "body": [{ "type": "paragraph", "text": "hello", "spans": [] }] }]
                    }
                })
            })
            .collect();
        fs::write(
            dir.join("posts.json"),
            serde_json::to_string(&documents).unwrap(),
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.prismic.fixture = Some("posts.json".to_string());
        Blog::with_config(dir, config)
    }

    #[tokio::test]
    async fn test_generate_from_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let blog = fixture_blog(dir.path(), &["a", "b"]);

        run(&blog, false).await.unwrap();

        assert!(dir.path().join("public/index.html").exists());
        assert!(dir.path().join("public/post/a/index.html").exists());
        assert!(dir.path().join("public/post/b/index.html").exists());

        let cache = CacheDb::load(dir.path());
        assert!(cache.pages.contains_key("/post/a/"));
        assert_eq!(cache.pages["/"].output_path, "index.html");
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let dir = tempfile::tempdir().unwrap();
        let blog = fixture_blog(dir.path(), &["a"]);
        run(&blog, false).await.unwrap();
        assert!(dir.path().join(cache::CACHE_DIR).exists());

        clear_cache(&blog).unwrap();
        assert!(!dir.path().join(cache::CACHE_DIR).exists());
    }
}
