//! Show a single post

use anyhow::Result;

use crate::content::{reading_time, PostDetail, PostLoader};
use crate::helpers::{format_publication_date, parse_timezone};
use crate::i18n::Locale;
use crate::richtext;
use crate::Blog;

/// Print a post with its publication date and reading time
pub async fn run(blog: &Blog, uid: &str) -> Result<()> {
    let loader = PostLoader::new(blog.source()?, &blog.config.prismic.document_type);
    let post = loader.load(uid).await?;
    println!("{}", describe(blog, &post)?);
    Ok(())
}

fn describe(blog: &Blog, post: &PostDetail) -> Result<String> {
    let locale = Locale::from_tag(&blog.config.language);
    let date = format_publication_date(
        post.first_publication_date.as_deref(),
        &blog.config.date_format,
        locale,
        parse_timezone(&blog.config.timezone),
    )?;
    let minutes = reading_time(post, blog.config.words_per_minute);

    let mut out = format!(
        "{}\n{} | {} | {} {}\n",
        post.data.title,
        date,
        post.data.author,
        minutes,
        locale.strings().minutes
    );
    for section in &post.data.content {
        out.push('\n');
        if let Some(heading) = &section.heading {
            out.push_str(&format!("## {}\n", heading));
        }
        out.push_str(&richtext::as_text(&section.body));
        out.push('\n');
    }
    Ok(out)
}
