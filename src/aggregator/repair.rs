// src/aggregator/repair.rs
//! Title repair for feeds that glue category, date, headline and summary
//! into a single string with no separators. Each step is a pure function
//! over the input so the rules stay individually testable.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;

/// Category names the publisher prepends to glued titles.
const KNOWN_CATEGORY_PREFIXES: &[&str] = &[
    "Announcements",
    "Product",
    "Policy",
    "Research",
    "Interpretability",
    "Alignment",
    "Societal impacts",
    "Education",
    "Economics",
    "Events",
];

/// Descriptions shorter than this are considered split noise and replaced
/// by a generated fallback. Tuned threshold, keep as is.
const MIN_DESCRIPTION_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedTitle {
    pub title: String,
    pub description: String,
    /// Date found inside the glued string, if any. Callers use it only
    /// when the entry carried no explicit publish date.
    pub embedded_date: Option<DateTime<Utc>>,
}

/// Strip a known category prefix from the start, longest match first.
/// Returns the input unchanged when no category matches.
fn strip_category_prefix(s: &str) -> &str {
    let hit = KNOWN_CATEGORY_PREFIXES
        .iter()
        .filter(|c| s.starts_with(*c))
        .max_by_key(|c| c.len());
    match hit {
        Some(c) => s[c.len()..].trim_start(),
        None => s,
    }
}

fn date_pattern() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) \d{1,2}, \d{4}")
            .unwrap()
    })
}

/// Remove every embedded `Mon DD, YYYY` occurrence, capturing the first.
fn strip_embedded_date(s: &str) -> (String, Option<String>) {
    let re = date_pattern();
    let captured = re.find(s).map(|m| m.as_str().to_string());
    let cleaned = re.replace_all(s, "").trim().to_string();
    (cleaned, captured)
}

/// Split at the first point where a lowercase letter is immediately
/// followed by an uppercase one. The lowercase letter stays with the head.
fn split_at_case_boundary(s: &str) -> Option<(String, String)> {
    let mut prev: Option<char> = None;
    for (i, ch) in s.char_indices() {
        if let Some(p) = prev {
            if p.is_lowercase() && ch.is_uppercase() {
                return Some((s[..i].to_string(), s[i..].to_string()));
            }
        }
        prev = Some(ch);
    }
    None
}

fn parse_embedded_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%b %d, %Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Run the full repair sequence: strip category, strip/capture date, split
/// title from description, substitute a fallback description when the
/// split remainder is too short to be real prose.
pub fn repair_glued_title(raw_title: &str, source_display_name: &str) -> RepairedTitle {
    let without_category = strip_category_prefix(raw_title.trim());
    let (cleaned, date_str) = strip_embedded_date(without_category);

    let (title, description) = match split_at_case_boundary(&cleaned) {
        Some((head, tail)) => (head.trim().to_string(), tail.trim().to_string()),
        None => (cleaned.trim().to_string(), String::new()),
    };

    let description = if description.chars().count() < MIN_DESCRIPTION_CHARS {
        format!("Research from {source_display_name}: {title}")
    } else {
        description
    };

    RepairedTitle {
        title,
        description,
        embedded_date: date_str.as_deref().and_then(parse_embedded_date),
    }
}
