//! Reading time estimation

use super::PostDetail;
use crate::richtext;

/// Average reading speed used when none is configured
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Count the words of a text.
///
/// Words are separated by Unicode whitespace; runs of separators count once
/// and leading or trailing whitespace adds nothing.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words of every body block and every non-empty heading of a post
pub fn post_word_count(post: &PostDetail) -> usize {
    let sections = &post.data.content;

    let body_words: usize = sections
        .iter()
        .map(|section| count_words(&richtext::as_text(&section.body)))
        .sum();

    let heading_words: usize = sections
        .iter()
        .filter_map(|section| section.heading.as_deref())
        .map(count_words)
        .sum();

    body_words + heading_words
}

/// Minutes needed to read `words`, rounded up. Zero words take zero minutes.
pub fn minutes_for(words: usize, words_per_minute: usize) -> usize {
    let wpm = if words_per_minute == 0 {
        DEFAULT_WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    words.div_ceil(wpm)
}

/// Estimated reading time of a post in minutes
pub fn reading_time(post: &PostDetail, words_per_minute: usize) -> usize {
    minutes_for(post_word_count(post), words_per_minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentSection, DetailData};
    use crate::richtext::TextBlock;

    fn post(sections: Vec<ContentSection>) -> PostDetail {
        PostDetail {
            uid: Some("p".to_string()),
            first_publication_date: None,
            data: DetailData {
                content: sections,
                ..Default::default()
            },
        }
    }

    fn section(heading: Option<&str>, body: &[&str]) -> ContentSection {
        ContentSection {
            heading: heading.map(str::to_string),
            body: body.iter().map(|t| TextBlock::paragraph(t)).collect(),
        }
    }

    fn words(n: usize) -> String {
        vec!["palavra"; n].join(" ")
    }

    #[test]
    fn test_count_words_collapses_whitespace() {
        assert_eq!(count_words("hello world"), 2);
        assert_eq!(count_words("  hello   world \n again\t"), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words("olá\u{00A0}mundo"), 2);
    }

    #[test]
    fn test_two_sections_example() {
        let post = post(vec![
            section(Some("Intro"), &["hello world"]),
            section(None, &["one two three four"]),
        ]);
        assert_eq!(post_word_count(&post), 7);
        assert_eq!(reading_time(&post, DEFAULT_WORDS_PER_MINUTE), 1);
    }

    #[test]
    fn test_rounding_boundaries() {
        assert_eq!(minutes_for(0, 200), 0);
        assert_eq!(minutes_for(1, 200), 1);
        assert_eq!(minutes_for(200, 200), 1);
        assert_eq!(minutes_for(201, 200), 2);
        assert_eq!(minutes_for(401, 200), 3);
    }

    #[test]
    fn test_monotonic_in_word_count() {
        let mut last = 0;
        for n in 0..1000 {
            let minutes = minutes_for(n, 200);
            assert!(minutes >= last);
            last = minutes;
        }
    }

    #[test]
    fn test_empty_post_takes_zero_minutes() {
        assert_eq!(reading_time(&post(vec![]), 200), 0);
        let blank = post(vec![section(Some(""), &["  "])]);
        assert_eq!(reading_time(&blank, 200), 0);
    }

    #[test]
    fn test_blocks_of_a_section_do_not_merge_words() {
        let post = post(vec![section(None, &["end", "start"])]);
        assert_eq!(post_word_count(&post), 2);
    }

    #[test]
    fn test_reading_time_from_post() {
        let post = post(vec![
            section(Some("Um dois"), &[words(150).as_str()]),
            section(None, &[words(49).as_str()]),
        ]);
        // 150 + 49 + 2 headings words = 201
        assert_eq!(reading_time(&post, 200), 2);
        assert_eq!(reading_time(&post, 0), 2);
    }
}
