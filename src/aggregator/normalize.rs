// src/aggregator/normalize.rs
//! Entry normalization: description selection, HTML cleanup, feed date
//! parsing and snippet truncation into the canonical article shape.

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::aggregator::repair;
use crate::aggregator::types::{Article, FeedQuirk, RawFeedEntry, SourceDescriptor};

/// Description candidates shorter than this lose to the next candidate.
/// Tuned threshold, keep as is.
const MIN_DESCRIPTION_CHARS: usize = 10;

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re.replace_all(s, " ").trim().to_string()
}

/// Decode HTML entities, drop tags, collapse whitespace.
pub fn strip_html(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = re_tags.replace_all(&decoded, " ");
    collapse_whitespace(&stripped)
}

/// Cap a string at `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}

/// Parse the date formats feeds actually emit: RFC 2822, RFC 3339, and the
/// occasional naive `YYYY-MM-DD HH:MM:SS`.
pub fn parse_feed_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc2822) {
        return DateTime::from_timestamp(dt.unix_timestamp(), 0);
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return DateTime::from_timestamp(dt.unix_timestamp(), 0);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn paragraph_pattern() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<p[^>]*>(.*?)</p>").unwrap())
}

/// First `<p>` whose text qualifies: not a "Discussion" paragraph and long
/// enough to be real prose.
fn first_paragraph(html: &str) -> Option<String> {
    for cap in paragraph_pattern().captures_iter(html) {
        let inner = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        let text = strip_html(inner);
        if text.contains("Discussion") {
            continue;
        }
        if text.chars().count() >= MIN_DESCRIPTION_CHARS {
            return Some(text);
        }
    }
    None
}

/// Plain snippet with everything from the first "Discussion" onward cut off.
fn snippet_without_discussion(s: &str) -> String {
    let cut = match s.find("Discussion") {
        Some(idx) => &s[..idx],
        None => s,
    };
    strip_html(cut)
}

/// Description selection order: first qualifying `<p>` from the HTML body,
/// then the trimmed plain snippet, then a generated fallback. The order and
/// the length minimum are part of the output contract.
fn select_description(raw: &RawFeedEntry, title: &str) -> String {
    if let Some(p) = first_paragraph(raw.summary_html()) {
        return p;
    }
    let snippet = snippet_without_discussion(raw.snippet());
    if snippet.chars().count() >= MIN_DESCRIPTION_CHARS {
        return snippet;
    }
    format!("Latest update: {title}")
}

/// Map one raw entry into the canonical article shape. Entries without a
/// link or a usable title are dropped.
pub fn normalize_entry(
    source: &SourceDescriptor,
    raw: &RawFeedEntry,
    snippet_max_chars: usize,
) -> Option<Article> {
    let link = raw.link().trim();
    if link.is_empty() {
        return None;
    }

    let mut published_at = parse_feed_date(raw.published_at());

    let (title, description) = match source.quirk {
        Some(FeedQuirk::GluedMetadataTitle) => {
            let repaired = repair::repair_glued_title(raw.title(), &source.display_name);
            if published_at.is_none() {
                published_at = repaired.embedded_date;
            }
            (repaired.title, repaired.description)
        }
        None => {
            let title = collapse_whitespace(&html_escape::decode_html_entities(raw.title()));
            let description = select_description(raw, &title);
            (title, description)
        }
    };

    if title.is_empty() {
        return None;
    }

    Some(Article {
        title,
        link: link.to_string(),
        published_at,
        content_snippet: truncate_chars(&collapse_whitespace(&description), snippet_max_chars),
        source_id: source.id.clone(),
        source_display_name: source.display_name.clone(),
        logo_url: source.logo_url.clone(),
        image_url: raw.enclosure_url.clone(),
    })
}
