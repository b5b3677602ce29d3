//! Structured text rendering
//!
//! Body fields arrive as a list of blocks, each carrying its plain text and a
//! list of formatting spans addressed by UTF-16 offsets (the CMS counts
//! positions the way JavaScript strings do).

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, push_escaped};

fn paragraph() -> String {
    "paragraph".to_string()
}

/// One block of structured text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "type", default = "paragraph")]
    pub block_type: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image blocks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl TextBlock {
    pub fn paragraph(text: &str) -> Self {
        Self {
            block_type: paragraph(),
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }
}

/// Inline formatting over `[start, end)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    #[serde(rename = "type")]
    pub span_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub target: Option<String>,
}

/// Plain text of a list of blocks, joined by a single space
pub fn as_text(blocks: &[TextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML markup of a list of blocks
pub fn as_html(blocks: &[TextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block.block_type.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        html.push_str(&render_block(block));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn render_block(block: &TextBlock) -> String {
    let inner = render_spans(&block.text, &block.spans);
    match block.block_type.as_str() {
        t @ ("heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6") => {
            let level = &t["heading".len()..];
            format!("<h{level}>{inner}</h{level}>")
        }
        "preformatted" => format!("<pre>{}</pre>", inner),
        "list-item" | "o-list-item" => format!("<li>{}</li>", inner),
        "image" => format!(
            r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
            html_escape(block.url.as_deref().unwrap_or("")),
            html_escape(block.alt.as_deref().unwrap_or(""))
        ),
        _ => format!("<p>{}</p>", inner),
    }
}

fn is_rendered(span: &Span) -> bool {
    match span.span_type.as_str() {
        "strong" | "em" => true,
        "hyperlink" => span.data.as_ref().and_then(|d| d.url.as_ref()).is_some(),
        _ => false,
    }
}

fn open_tag(span: &Span) -> String {
    match span.span_type.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        _ => {
            let data = span.data.clone().unwrap_or_default();
            let url = data.url.unwrap_or_default();
            match data.target {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    html_escape(&url),
                    html_escape(&target)
                ),
                None => format!(r#"<a href="{}">"#, html_escape(&url)),
            }
        }
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.span_type.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        _ => "</a>",
    }
}

/// Apply spans to text; overlapping spans are closed and reopened so the
/// output stays well nested
fn render_spans(text: &str, spans: &[Span]) -> String {
    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && is_rendered(s))
        .collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut offset = 0;

    for ch in text.chars() {
        sync_spans(&mut out, &mut open, &spans, offset);
        match ch {
            '\n' => out.push_str("<br />"),
            c => push_escaped(&mut out, c),
        }
        offset += ch.len_utf16();
    }

    for span in open.iter().rev() {
        out.push_str(close_tag(span));
    }

    out
}

fn sync_spans<'a>(out: &mut String, open: &mut Vec<&'a Span>, spans: &[&'a Span], offset: usize) {
    let active: Vec<&Span> = spans
        .iter()
        .copied()
        .filter(|s| s.start <= offset && offset < s.end)
        .collect();

    let common = open
        .iter()
        .zip(active.iter())
        .take_while(|(a, b)| std::ptr::eq(**a, **b))
        .count();

    if common == open.len() && common == active.len() {
        return;
    }

    for span in open[common..].iter().rev() {
        out.push_str(close_tag(span));
    }
    for span in &active[common..] {
        out.push_str(&open_tag(span));
    }
    *open = active;
}
