//! Content module - post models, the detail loader and reading time

pub mod loader;
mod post;
mod reading;

pub use loader::PostLoader;
pub use post::{
    Banner, ContentSection, DetailData, PostDetail, PostSummary, RawPost, RawPostData,
    ResultsPage, SummaryData,
};
pub use reading::{count_words, minutes_for, post_word_count, reading_time, DEFAULT_WORDS_PER_MINUTE};
