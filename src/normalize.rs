//! Maps raw feed entries onto the fixed item shape served by the API.
//!
//! Normalization never fails: every field has a fallback.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::{Locale, SourceConfig};
use crate::fetcher::RawEntry;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>?").unwrap());

const ELLIPSIS: &str = "...";
const LINK_PLACEHOLDER: &str = "#";

const MONTHS_MK: [&str; 12] = [
    "јан.", "фев.", "мар.", "апр.", "мај", "јун.", "јул.", "авг.", "сеп.", "окт.", "ное.",
    "дек.",
];
const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub description: String,
    pub link: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub source: String,
    pub color: String,
}

impl Locale {
    pub fn untitled(self) -> &'static str {
        match self {
            Locale::Mk => "Без наслов",
            Locale::En => "Untitled",
        }
    }

    pub fn today(self) -> &'static str {
        match self {
            Locale::Mk => "Денес",
            Locale::En => "Today",
        }
    }

    fn month_abbr(self, month0: u32) -> &'static str {
        let months = match self {
            Locale::Mk => &MONTHS_MK,
            Locale::En => &MONTHS_EN,
        };
        months[month0 as usize % 12]
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    locale: Locale,
    offset: FixedOffset,
    description_length: usize,
}

impl Normalizer {
    /// Offsets outside +/-24h fall back to UTC.
    pub fn new(locale: Locale, utc_offset_minutes: i32, description_length: usize) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());

        Self {
            locale,
            offset,
            description_length,
        }
    }

    pub fn normalize(&self, entry: &RawEntry, source: &SourceConfig) -> NewsItem {
        let title = entry
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(self.locale.untitled())
            .to_string();

        let description = truncate_description(
            &strip_html(entry.summary.as_deref().unwrap_or_default()),
            self.description_length,
        );

        let link = entry
            .link
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(LINK_PLACEHOLDER)
            .to_string();

        let pub_date = entry
            .published
            .map(|p| self.format_date(p))
            .unwrap_or_else(|| self.locale.today().to_string());

        NewsItem {
            title,
            description,
            link,
            pub_date,
            source: source.name.clone(),
            color: source.color.clone(),
        }
    }

    /// Day, abbreviated month and 24-hour time: `9 дек., во 12:00` or `9 Dec, 12:00`.
    pub fn format_date(&self, published: DateTime<Utc>) -> String {
        let local = published.with_timezone(&self.offset);
        let connector = match self.locale {
            Locale::Mk => "во ",
            Locale::En => "",
        };
        format!(
            "{} {}, {}{:02}:{:02}",
            local.day(),
            self.locale.month_abbr(local.month0()),
            connector,
            local.hour(),
            local.minute()
        )
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Locale::default(), 0, 120)
    }
}

/// Reduce markup to plain text: drop every `<...>` span (including an
/// unterminated trailing one), decode entities, then drop any tags the
/// decoding exposed.
pub fn strip_html(text: &str) -> String {
    let without_tags = HTML_TAG.replace_all(text, "");
    let decoded = html_escape::decode_html_entities(&without_tags);
    HTML_TAG.replace_all(&decoded, "").trim().to_string()
}

/// Keep the first `max_chars` characters and always append an ellipsis.
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(ELLIPSIS);
    out
}
