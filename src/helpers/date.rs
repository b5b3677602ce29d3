//! Date helper functions

use chrono::{DateTime, FixedOffset, TimeZone};
use chrono_tz::Tz;

use crate::error::{BlogError, Result};
use crate::i18n::Locale;

/// Parse a CMS timestamp.
///
/// Accepts RFC 3339 (`2021-03-25T00:00:00+00:00`) and the compact offset the
/// Prismic API emits (`2021-03-25T00:00:00+0000`).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map_err(|_| BlogError::InvalidDate(raw.to_string()))
}

/// Format a date with a date-fns style pattern
///
/// # Examples
/// ```ignore
/// format_date(&date, "dd MMM yyyy", Locale::PtBr) // -> "25 mar 2021"
/// ```
pub fn format_date<Tz2: TimeZone>(date: &DateTime<Tz2>, pattern: &str, locale: Locale) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let chrono_format = date_fns_to_chrono_format(pattern);
    date.format_localized(&chrono_format, locale.chrono_locale())
        .to_string()
}

/// Convert a date-fns pattern to a chrono format string.
///
/// Supports `yyyy yy MMMM MMM MM M dd d HH H mm m ss s` and `'quoted'`
/// literals (`''` is a single quote). Anything else is copied as is.
pub fn date_fns_to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                match (chars[i], chars.get(i + 1).copied()) {
                    ('\'', Some('\'')) => {
                        out.push('\'');
                        i += 2;
                    }
                    ('\'', _) => break,
                    (literal, _) => {
                        push_literal(&mut out, literal);
                        i += 1;
                    }
                }
            }
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&other| other == c).count();
        let specifier = match (c, run) {
            ('y', 2) => Some("%y"),
            ('y', _) => Some("%Y"),
            ('M', 1) => Some("%-m"),
            ('M', 2) => Some("%m"),
            ('M', 3) => Some("%b"),
            ('M', _) => Some("%B"),
            ('d', 1) => Some("%-d"),
            ('d', _) => Some("%d"),
            ('H', 1) => Some("%-H"),
            ('H', _) => Some("%H"),
            ('m', 1) => Some("%-M"),
            ('m', _) => Some("%M"),
            ('s', 1) => Some("%-S"),
            ('s', _) => Some("%S"),
            _ => None,
        };

        match specifier {
            Some(specifier) => out.push_str(specifier),
            None => (0..run).for_each(|_| push_literal(&mut out, c)),
        }
        i += run;
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Format a raw publication timestamp for display.
///
/// The date is shown in its own offset unless `timezone` names an IANA
/// zone. A missing timestamp renders as an empty string.
pub fn format_publication_date(
    raw: Option<&str>,
    pattern: &str,
    locale: Locale,
    timezone: Option<Tz>,
) -> Result<String> {
    let Some(raw) = raw else {
        return Ok(String::new());
    };

    let date = parse_timestamp(raw)?;
    Ok(match timezone {
        Some(tz) => format_date(&date.with_timezone(&tz), pattern, locale),
        None => format_date(&date, pattern, locale),
    })
}

/// Resolve a configured zone name, empty means "keep the CMS offset"
pub fn parse_timezone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(e) => {
            tracing::warn!("Ignoring unknown timezone {:?}: {}", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_prismic_offset() {
        let date = parse_timestamp("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(date.year(), 2021);
        assert_eq!(date.hour(), 19);
        assert!(parse_timestamp("2021-03-25T19:25:28+00:00").is_ok());
        assert!(parse_timestamp("2021-03-25T19:25:28.120Z").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(BlogError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_publication_date_pt_br() {
        let display = format_publication_date(
            Some("2021-03-25T00:00:00+0000"),
            "dd MMM yyyy",
            Locale::PtBr,
            None,
        )
        .unwrap();
        assert_eq!(display, "25 mar 2021");
    }

    #[test]
    fn test_publication_date_with_timezone() {
        let tz = parse_timezone("America/Sao_Paulo");
        let display = format_publication_date(
            Some("2021-03-25T00:00:00+0000"),
            "dd MMM yyyy",
            Locale::PtBr,
            tz,
        )
        .unwrap();
        assert_eq!(display, "24 mar 2021");
    }

    #[test]
    fn test_publication_date_missing() {
        let display = format_publication_date(None, "dd MMM yyyy", Locale::PtBr, None).unwrap();
        assert_eq!(display, "");
    }

    #[test]
    fn test_format_tokens() {
        let date = parse_timestamp("2024-01-05T08:03:09+0000").unwrap();
        assert_eq!(format_date(&date, "yyyy-MM-dd", Locale::En), "2024-01-05");
        assert_eq!(format_date(&date, "d/M/yy", Locale::En), "5/1/24");
        assert_eq!(format_date(&date, "HH:mm:ss", Locale::En), "08:03:09");
        assert_eq!(format_date(&date, "MMMM d", Locale::PtBr), "janeiro 5");
        assert_eq!(
            format_date(&date, "dd 'de' MMMM", Locale::PtBr),
            "05 de janeiro"
        );
    }

    #[test]
    fn test_pattern_conversion() {
        assert_eq!(date_fns_to_chrono_format("dd MMM yyyy"), "%d %b %Y");
        assert_eq!(date_fns_to_chrono_format("d/M/yy HH:mm"), "%-d/%-m/%y %H:%M");
        assert_eq!(date_fns_to_chrono_format("dd 'de' MMMM"), "%d de %B");
        assert_eq!(date_fns_to_chrono_format("'it''s' d"), "it's %-d");
        assert_eq!(date_fns_to_chrono_format("100% d"), "100%% %-d");
    }

    #[test]
    fn test_month_names_come_from_the_locale() {
        let date = parse_timestamp("2021-02-10T12:00:00+0000").unwrap();
        assert_eq!(format_date(&date, "MMM", Locale::PtBr), "fev");
        assert_eq!(format_date(&date, "MMM", Locale::En), "Feb");
        let date = parse_timestamp("2021-03-10T12:00:00+0000").unwrap();
        assert_eq!(format_date(&date, "MMMM", Locale::PtBr), "março");
        assert_eq!(format_date(&date, "MMMM", Locale::En), "March");
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("").is_none());
        assert!(parse_timezone("Not/AZone").is_none());
        assert_eq!(parse_timezone("UTC"), Some(Tz::UTC));
    }
}
