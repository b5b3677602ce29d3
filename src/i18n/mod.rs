//! Locale data for dates and the few interface strings of the blog

/// Supported display languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    PtBr,
    En,
}

impl Locale {
    /// Resolve a language tag such as `pt-BR`, `pt_br` or `en-US`.
    /// Unknown tags fall back to Brazilian Portuguese.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase().replace('_', "-");
        if tag == "en" || tag.starts_with("en-") {
            Locale::En
        } else {
            if !(tag.is_empty() || tag == "pt" || tag.starts_with("pt-")) {
                tracing::warn!("Unsupported language {:?}, using pt-BR", tag);
            }
            Locale::PtBr
        }
    }

    /// Language attribute for the `<html>` element
    pub fn html_lang(&self) -> &'static str {
        match self {
            Locale::PtBr => "pt-BR",
            Locale::En => "en",
        }
    }

    /// Locale used by chrono for month names
    pub fn chrono_locale(&self) -> chrono::Locale {
        match self {
            Locale::PtBr => chrono::Locale::pt_BR,
            Locale::En => chrono::Locale::en_US,
        }
    }

    /// Interface strings used by the templates
    pub fn strings(&self) -> UiStrings {
        match self {
            Locale::PtBr => UiStrings {
                load_more: "Carregar mais posts",
                loading: "Carregando...",
                minutes: "min",
                not_found: "Post não encontrado",
                back_home: "Voltar para a home",
            },
            Locale::En => UiStrings {
                load_more: "Load more posts",
                loading: "Loading...",
                minutes: "min",
                not_found: "Post not found",
                back_home: "Back to home",
            },
        }
    }
}

/// Translated labels inserted into template contexts
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct UiStrings {
    pub load_more: &'static str,
    pub loading: &'static str,
    pub minutes: &'static str,
    pub not_found: &'static str,
    pub back_home: &'static str,
}
