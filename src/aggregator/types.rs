// src/aggregator/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Per-source normalizer selector for feeds that need special handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedQuirk {
    /// Titles arrive as one concatenated string holding category, date,
    /// headline and summary with no separators between them.
    GluedMetadataTitle,
}

/// Static configuration for one publisher.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SourceDescriptor {
    pub id: String,           // e.g., "openai"
    pub display_name: String, // e.g., "OpenAI"
    pub primary_url: String,
    #[serde(default)]
    pub secondary_url: Option<String>,
    pub logo_url: String,
    #[serde(default)]
    pub quirk: Option<FeedQuirk>,
}

/// One parsed feed item before normalization. Shapes vary per publisher,
/// so every field is optional and read through the accessors below.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<String>,
    pub summary_html: Option<String>,
    pub snippet: Option<String>,
    pub enclosure_url: Option<String>,
}

impl RawFeedEntry {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn link(&self) -> &str {
        self.link.as_deref().unwrap_or_default()
    }

    pub fn published_at(&self) -> &str {
        self.published_at.as_deref().unwrap_or_default()
    }

    pub fn summary_html(&self) -> &str {
        self.summary_html.as_deref().unwrap_or_default()
    }

    /// Plain-text snippet if the feed carried one, else the HTML body.
    pub fn snippet(&self) -> &str {
        match self.snippet.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => self.summary_html(),
        }
    }
}

/// Canonical output unit shared by the updates, news and trending payloads.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    /// Absolute URL; identity key within one assembled response.
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub content_snippet: String,
    pub source_id: String,
    pub source_display_name: String,
    pub logo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Article {
    /// Sort key for newest-first ordering; dateless entries sink to the end.
    pub fn recency_key(&self) -> i64 {
        self.published_at
            .map(|d| d.timestamp_millis())
            .unwrap_or(i64::MIN)
    }
}

#[async_trait::async_trait]
pub trait FeedFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<RawFeedEntry>>;
}
