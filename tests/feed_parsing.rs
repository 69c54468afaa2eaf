// tests/feed_parsing.rs
//
// Fixture-driven tests: realistic RSS and Atom bodies from disk, run
// through the wire parser and then the normalizer, checking the exact
// articles a consumer would receive.

use chrono::{TimeZone, Utc};

use ai_news_aggregator::aggregator::fetch::parse_feed;
use ai_news_aggregator::aggregator::normalize::normalize_entry;
use ai_news_aggregator::{Article, FeedQuirk, RawFeedEntry, SourceDescriptor};

const VENDOR_RSS: &str = include_str!("fixtures/vendor_news_rss.xml");
const RESEARCH_ATOM: &str = include_str!("fixtures/research_blog_atom.xml");
const GLUED_RSS: &str = include_str!("fixtures/glued_digest_rss.xml");

fn plain_source(id: &str, name: &str) -> SourceDescriptor {
    SourceDescriptor {
        id: id.to_string(),
        display_name: name.to_string(),
        primary_url: format!("https://{id}.example/feed.xml"),
        secondary_url: None,
        logo_url: format!("/logos/{id}.png"),
        quirk: None,
    }
}

fn normalize_all(source: &SourceDescriptor, raw: &[RawFeedEntry]) -> Vec<Article> {
    raw.iter()
        .filter_map(|e| normalize_entry(source, e, 200))
        .collect()
}

#[test]
fn vendor_rss_parses_every_item() {
    let entries = parse_feed(VENDOR_RSS).expect("vendor rss parses");
    assert_eq!(entries.len(), 4);

    let first = &entries[0];
    assert_eq!(first.title.as_deref(), Some("What's new in the reasoning stack"));
    assert_eq!(
        first.link.as_deref(),
        Some("https://vendor.example/news/reasoning-stack")
    );
    assert_eq!(
        first.enclosure_url.as_deref(),
        Some("https://vendor.example/assets/reasoning.png")
    );
    assert!(
        first.summary_html.as_deref().unwrap().contains("Discussion"),
        "raw entries keep the full html body"
    );
}

#[test]
fn vendor_rss_normalizes_to_consumer_articles() {
    let source = plain_source("vendor", "Vendor");
    let entries = parse_feed(VENDOR_RSS).expect("vendor rss parses");
    let articles = normalize_all(&source, &entries);

    // The linkless draft item is dropped.
    assert_eq!(articles.len(), 3);

    let first = &articles[0];
    assert_eq!(first.title, "What's new in the reasoning stack");
    assert_eq!(
        first.content_snippet,
        "The new reasoning stack improves multi-step planning and cuts latency for long tool chains across the API.",
        "forum-discussion paragraph is skipped in favor of real prose"
    );
    assert_eq!(
        first.published_at,
        Some(Utc.with_ymd_and_hms(2025, 3, 27, 10, 0, 0).unwrap())
    );
    assert_eq!(
        first.image_url.as_deref(),
        Some("https://vendor.example/assets/reasoning.png")
    );

    assert_eq!(
        articles[1].content_snippet,
        "General availability for the o-series starts today, with new rate limits for scaled workloads.",
        "plain descriptions pass through untouched"
    );

    assert_eq!(
        articles[2].content_snippet,
        "Pricing updates land next month for all tiers.",
        "markup inside descriptions is unwrapped"
    );
}

#[test]
fn atom_link_selection_prefers_alternate() {
    let entries = parse_feed(RESEARCH_ATOM).expect("atom parses");
    assert_eq!(entries.len(), 3);

    // rel="self" listed first must lose to rel="alternate".
    assert_eq!(
        entries[0].link.as_deref(),
        Some("https://research.example/blog/scaling-retrieval")
    );
    // A bare link with no rel counts as the alternate.
    assert_eq!(
        entries[1].link.as_deref(),
        Some("https://research.example/blog/retired-benchmarks")
    );
    // With only a self link available, any href beats none.
    assert_eq!(
        entries[2].link.as_deref(),
        Some("https://research.example/feed/403.atom")
    );
}

#[test]
fn atom_dates_and_bodies_normalize() {
    let source = plain_source("research", "Research Blog");
    let entries = parse_feed(RESEARCH_ATOM).expect("atom parses");
    let articles = normalize_all(&source, &entries);
    assert_eq!(articles.len(), 3);

    // <published> wins over <updated> when both exist.
    assert_eq!(
        articles[0].published_at,
        Some(Utc.with_ymd_and_hms(2025, 6, 5, 9, 0, 0).unwrap())
    );
    assert_eq!(
        articles[0].content_snippet, "Longer contexts change the retrieval trade-off.",
        "html content body beats the plain summary"
    );

    // Entries without <published> fall back to <updated>.
    assert_eq!(
        articles[1].published_at,
        Some(Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap())
    );
    assert_eq!(
        articles[1].content_snippet,
        "Saturated evals tell you less than their error bars suggest."
    );
}

#[test]
fn glued_digest_titles_are_repaired() {
    let mut source = plain_source("anthropic", "Anthropic");
    source.quirk = Some(FeedQuirk::GluedMetadataTitle);

    let entries = parse_feed(GLUED_RSS).expect("digest rss parses");
    let articles = normalize_all(&source, &entries);
    assert_eq!(articles.len(), 3);

    let tools = &articles[0];
    assert_eq!(tools.title, "Claude can now use tools");
    assert_eq!(
        tools.content_snippet,
        "Tool use lets the model call functions you define in the request"
    );
    // No pubDate in the feed, so the date embedded in the title is used.
    assert_eq!(
        tools.published_at,
        Some(Utc.with_ymd_and_hms(2025, 5, 30, 0, 0, 0).unwrap())
    );

    assert_eq!(articles[1].title, "Values in the wild");

    let framework = &articles[2];
    assert_eq!(framework.title, "A framework for frontier model security");
    // An explicit pubDate (Apr 14) overrides the embedded Apr 10 date.
    assert_eq!(
        framework.published_at,
        Some(Utc.with_ymd_and_hms(2025, 4, 14, 16, 30, 0).unwrap())
    );
}
