//! Built-in templates using the Tera template engine
//!
//! The templates are embedded directly in the binary. Dates reach the
//! templates as the raw CMS timestamps and are formatted by the
//! `publication_date` filter, so every page formats them the same way.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::error::Result;
use crate::helpers::{format_publication_date, parse_timezone, post_path, url_for};
use crate::i18n::{Locale, UiStrings};
use crate::richtext::{self, TextBlock};

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
    site: SiteData,
    labels: UiStrings,
}

/// Site-wide values available to every template as `site`
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub lang: String,
    pub url: String,
    pub root: String,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates and filters loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("loading.html", include_str!("spacetraveling/loading.html")),
            ("not_found.html", include_str!("spacetraveling/not_found.html")),
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        let locale = Locale::from_tag(&config.language);
        let timezone = parse_timezone(&config.timezone);
        let pattern = config.date_format.clone();
        tera.register_filter(
            "publication_date",
            move |value: &tera::Value,
                  _args: &HashMap<String, tera::Value>|
                  -> tera::Result<tera::Value> {
                publication_date_filter(value, &pattern, locale, timezone)
            },
        );

        let post_config = config.clone();
        tera.register_filter(
            "post_url",
            move |value: &tera::Value,
                  _args: &HashMap<String, tera::Value>|
                  -> tera::Result<tera::Value> {
                let uid = value.as_str().unwrap_or_default();
                if uid.is_empty() {
                    return Ok(tera::Value::String(url_for(&post_config, "/")));
                }
                Ok(tera::Value::String(url_for(&post_config, &post_path(uid))))
            },
        );

        tera.register_filter("rich_text", rich_text_filter);

        let site = SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            lang: locale.html_lang().to_string(),
            url: config.url.clone(),
            root: url_for(config, "/"),
        };

        Ok(Self {
            tera,
            site,
            labels: locale.strings(),
        })
    }

    /// A context holding `site` and `labels`
    pub fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("labels", &self.labels);
        context
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: raw timestamp (or null) to display date
fn publication_date_filter(
    value: &tera::Value,
    pattern: &str,
    locale: Locale,
    timezone: Option<chrono_tz::Tz>,
) -> tera::Result<tera::Value> {
    let raw = match value {
        tera::Value::Null => None,
        tera::Value::String(s) => Some(s.as_str()),
        other => {
            return Err(tera::Error::msg(format!(
                "publication_date expects a string, got {}",
                other
            )))
        }
    };

    format_publication_date(raw, pattern, locale, timezone)
        .map(tera::Value::String)
        .map_err(|e| tera::Error::msg(e.to_string()))
}

/// Tera filter: structured text blocks to HTML
fn rich_text_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let blocks: Vec<TextBlock> = tera::from_value(value.clone())
        .map_err(|e| tera::Error::msg(format!("rich_text expects text blocks: {}", e)))?;
    Ok(tera::Value::String(richtext::as_html(&blocks)))
}
