// src/aggregator/fetch.rs
//! HTTP feed fetching and RSS/Atom parsing into raw entries.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::aggregator::types::{FeedFetch, RawFeedEntry};

/// Some feed endpoints reject non-browser clients.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_FEEDS: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.5";

// ---------- RSS 2.0 ----------

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    // quick-xml exposes the namespaced <content:encoded> by its local name.
    #[serde(rename = "encoded")]
    content_encoded: Option<String>,
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
}

// ---------- Atom ----------

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextValue>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<TextValue>,
    content: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(rename = "$text")]
    value: Option<String>,
}

impl TextValue {
    fn into_inner(self) -> Option<String> {
        self.value.filter(|s| !s.trim().is_empty())
    }
}

/// Parse a feed body as RSS 2.0, falling back to Atom.
pub fn parse_feed(body: &str) -> Result<Vec<RawFeedEntry>> {
    let t0 = std::time::Instant::now();
    let clean = scrub_html_entities_for_xml(body);

    let entries = match from_str::<Rss>(&clean) {
        Ok(rss) => rss_entries(rss),
        // The atom struct would accept any root element with zero entries,
        // so only fall through for bodies that actually look like atom.
        Err(_) if clean.contains("<feed") => {
            let atom: AtomFeed = from_str(&clean).context("parsing atom feed xml")?;
            atom_entries(atom)
        }
        Err(rss_err) => bail!("unrecognized feed format: {rss_err}"),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("news_parse_ms").record(ms);
    counter!("news_entries_total").increment(entries.len() as u64);
    Ok(entries)
}

fn rss_entries(rss: Rss) -> Vec<RawFeedEntry> {
    rss.channel
        .item
        .into_iter()
        .map(|it| RawFeedEntry {
            title: it.title,
            link: it.link,
            published_at: it.pub_date,
            summary_html: it.content_encoded.or_else(|| it.description.clone()),
            snippet: it.description,
            enclosure_url: it.enclosure.and_then(|e| e.url),
        })
        .collect()
}

fn atom_entries(feed: AtomFeed) -> Vec<RawFeedEntry> {
    feed.entry
        .into_iter()
        .map(|e| {
            let link = pick_atom_link(&e.link);
            let summary = e.summary.and_then(TextValue::into_inner);
            let content = e.content.and_then(TextValue::into_inner);
            RawFeedEntry {
                title: e.title.and_then(TextValue::into_inner),
                link,
                published_at: e.published.or(e.updated),
                summary_html: content.or_else(|| summary.clone()),
                snippet: summary,
                enclosure_url: None,
            }
        })
        .collect()
}

/// Prefer the `alternate` link; fall back to the first link with an href.
fn pick_atom_link(links: &[AtomLink]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .and_then(|l| l.href.clone())
        .or_else(|| links.iter().find_map(|l| l.href.clone()))
}

/// Feeds routinely embed HTML entities that are not valid XML. Replace the
/// usual suspects before handing the body to the XML parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Production fetcher: shared reqwest client with browser-like headers.
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    /// The request timeout here is a transport-level backstop; the pipeline
    /// applies its own per-source deadline around the whole fetch.
    pub fn new(request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(request_timeout)
            .build()
            .expect("reqwest client");
        Self { client }
    }
}

#[async_trait]
impl FeedFetch for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawFeedEntry>> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_FEEDS)
            .send()
            .await
            .context("feed http get")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("feed responded with status {status}");
        }

        let body = resp.text().await.context("feed http body")?;
        parse_feed(&body)
    }
}
