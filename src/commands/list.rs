//! List posts from the CMS

use anyhow::Result;

use crate::helpers::{format_publication_date, parse_timezone};
use crate::i18n::Locale;
use crate::pagination::{ListController, ListViewState};
use crate::source::{Query, SharedSource};
use crate::Blog;

/// Print the posts of the first `pages` pages of the home page list
pub async fn run(blog: &Blog, pages: u32) -> Result<()> {
    let state = load(blog, blog.source()?, pages).await?;
    for line in lines(blog, &state)? {
        println!("{}", line);
    }
    Ok(())
}

/// The list state after following the cursor up to `pages` pages
pub async fn load(blog: &Blog, source: SharedSource, pages: u32) -> Result<ListViewState> {
    let prismic = &blog.config.prismic;
    let query = Query::post_summaries(&prismic.document_type, prismic.page_size);
    let first = source.query(&query).await?;

    let mut controller = ListController::new(ListViewState::from_first_page(first), source);
    controller.load_pages(pages.max(1)).await?;
    Ok(controller.into_state())
}

fn lines(blog: &Blog, state: &ListViewState) -> Result<Vec<String>> {
    let locale = Locale::from_tag(&blog.config.language);
    let timezone = parse_timezone(&blog.config.timezone);

    let mut lines = vec![format!("Posts ({}):", state.posts.len())];
    for post in &state.posts {
        let date = format_publication_date(
            post.first_publication_date.as_deref(),
            &blog.config.date_format,
            locale,
            timezone,
        )?;
        lines.push(format!(
            "  {} - {} [{}] {}",
            date,
            post.data.title,
            post.uid.as_deref().unwrap_or("-"),
            post.data.author
        ));
    }
    if state.has_more() {
        lines.push(format!("  ... more after page {}", state.current_page));
    }
    Ok(lines)
}
