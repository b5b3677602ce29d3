//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::{ENV_ACCESS_TOKEN, ENV_API_ENDPOINT};

const CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
# IANA zone used to display dates, e.g. America/Sao_Paulo.
# Empty keeps the offset sent by the CMS.
timezone: ''

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public
static_dir: static

# Rendering
date_format: dd MMM yyyy
words_per_minute: 200

# Seconds a rendered page is served before it is rendered again
revalidate: 43200

# Prismic repository
prismic:
  endpoint: ''
  document_type: posts
  page_size: 1
  static_paths: 3
  timeout_secs: 30
  # Serve documents from a JSON file instead of the API
  # fixture: posts.json
"#;

const STYLE: &str = r#"* {
  margin: 0;
  padding: 0;
  box-sizing: border-box;
}

body {
  background: #1a1d23;
  color: #d7d7d7;
  font-family: 'Inter', sans-serif;
}

a {
  color: inherit;
  text-decoration: none;
}

.content-container {
  max-width: 720px;
  margin: 0 auto;
  padding: 0 1rem;
}

.site-header {
  padding: 5rem 0 3rem;
}

.posts a {
  display: block;
  margin-bottom: 3rem;
}

.posts h1 {
  color: #fff;
  font-size: 1.75rem;
}

.info {
  display: flex;
  gap: 1.5rem;
  margin-top: 1.5rem;
  font-size: 0.875rem;
}

.load-more a {
  color: #ff57b2;
  font-weight: 600;
}

.banner img {
  width: 100%;
  max-height: 400px;
  object-fit: cover;
}

.post h1 {
  color: #fff;
  font-size: 3rem;
  margin-top: 5rem;
}

.post section {
  margin-top: 4rem;
  line-height: 1.6;
}

.post section h3 {
  color: #fff;
  font-size: 2.25rem;
  margin-bottom: 2rem;
}
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="26" viewBox="0 0 240 26">
  <text x="0" y="20" fill="#ff57b2" font-family="sans-serif" font-size="22" font-weight="700">spacetraveling.</text>
</svg>
"##;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("static/css"))?;
    fs::create_dir_all(target_dir.join("static/images"))?;

    write_if_missing(&target_dir.join("_config.yml"), CONFIG)?;
    write_if_missing(&target_dir.join("static/css/style.css"), STYLE)?;
    write_if_missing(&target_dir.join("static/images/logo.svg"), LOGO)?;

    let env = format!(
        "{}=https://your-repository.cdn.prismic.io/api/v2\n{}=\n",
        ENV_API_ENDPOINT, ENV_ACCESS_TOKEN
    );
    write_if_missing(&target_dir.join(".env.example"), &env)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::info!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}
