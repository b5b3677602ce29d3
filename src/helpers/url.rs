//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a query value
const QUERY_VALUE: &AsciiSet = &SEGMENT.add(b'&').add(b'=').add(b'+').add(b':');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello/") // -> "/blog/post/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Path of a post page relative to the site root
///
/// # Examples
/// ```ignore
/// post_path("como-utilizar-hooks") // -> "post/como-utilizar-hooks/"
/// ```
pub fn post_path(uid: &str) -> String {
    format!("post/{}/", utf8_percent_encode(uid, SEGMENT))
}

/// Link of the home page showing `pages` pages of posts
pub fn more_posts_path(config: &SiteConfig, pages: u32) -> String {
    format!("{}?pages={}", url_for(config, "/"), pages)
}

/// Percent-encode a value for use in a query string
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.url = "https://example.com".to_string();
        config.root = "/blog/".to_string();
        config
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/post/a/"), "/blog/post/a/");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/post/a/"),
            "https://example.com/blog/post/a/"
        );
    }

    #[test]
    fn test_post_path_encodes_segment() {
        assert_eq!(post_path("como-utilizar-hooks"), "post/como-utilizar-hooks/");
        assert_eq!(post_path("a b/c"), "post/a%20b%2Fc/");
    }

    #[test]
    fn test_more_posts_path() {
        let config = test_config();
        assert_eq!(more_posts_path(&config, 3), "/blog/?pages=3");
    }

    #[test]
    fn test_encode_query_value() {
        assert_eq!(
            encode_query_value("https://x.io/api?page=2&q=[[a]]"),
            "https%3A%2F%2Fx.io%2Fapi%3Fpage%3D2%26q%3D[[a]]"
        );
    }
}
