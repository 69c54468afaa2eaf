// src/aggregator/sources.rs
//! Built-in feed source registry plus an optional TOML override file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregator::types::{FeedQuirk, SourceDescriptor};

pub const ENV_SOURCES_PATH: &str = "NEWS_SOURCES_PATH";
const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";

fn descriptor(
    id: &str,
    display_name: &str,
    primary_url: &str,
    secondary_url: Option<&str>,
    quirk: Option<FeedQuirk>,
) -> SourceDescriptor {
    SourceDescriptor {
        id: id.to_string(),
        display_name: display_name.to_string(),
        primary_url: primary_url.to_string(),
        secondary_url: secondary_url.map(str::to_string),
        logo_url: format!("/logos/{id}.png"),
        quirk,
    }
}

/// The registry shipped with the binary. Order matters: the assembler
/// walks sources in this order when applying per-source quotas.
pub fn builtin_sources() -> Vec<SourceDescriptor> {
    vec![
        descriptor(
            "openai",
            "OpenAI",
            "https://openai.com/news/rss.xml",
            None,
            None,
        ),
        descriptor(
            "anthropic",
            "Anthropic",
            "https://rsshub.app/anthropic/news",
            None,
            Some(FeedQuirk::GluedMetadataTitle),
        ),
        descriptor(
            "google-deepmind",
            "Google DeepMind",
            "https://deepmind.google/blog/rss.xml",
            Some("https://blog.google/technology/google-deepmind/rss/"),
            None,
        ),
        descriptor(
            "meta-ai",
            "Meta AI",
            "https://ai.meta.com/blog/rss/",
            None,
            None,
        ),
        descriptor(
            "mistral",
            "Mistral AI",
            "https://mistral.ai/feed.xml",
            None,
            None,
        ),
        descriptor(
            "hugging-face",
            "Hugging Face",
            "https://huggingface.co/blog/feed.xml",
            None,
            None,
        ),
    ]
}

#[derive(serde::Deserialize)]
struct SourcesFile {
    sources: Vec<SourceDescriptor>,
}

/// Parse a sources file. Entries without an id or feed URL are rejected.
pub fn parse_sources_toml(content: &str) -> Result<Vec<SourceDescriptor>> {
    let file: SourcesFile = toml::from_str(content).context("parsing sources toml")?;
    for s in &file.sources {
        if s.id.trim().is_empty() || s.primary_url.trim().is_empty() {
            anyhow::bail!("source entry missing id or primary_url");
        }
    }
    Ok(file.sources)
}

pub fn load_sources_from(path: &Path) -> Result<Vec<SourceDescriptor>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    parse_sources_toml(&content)
}

/// Resolve the registry:
/// 1) $NEWS_SOURCES_PATH
/// 2) config/sources.toml
/// 3) built-ins
/// A broken override file logs a warning and falls back to the built-ins.
pub fn load_sources() -> Vec<SourceDescriptor> {
    let explicit = std::env::var(ENV_SOURCES_PATH).ok().map(PathBuf::from);
    let candidate = match &explicit {
        Some(p) => Some(p.clone()),
        None => {
            let default = PathBuf::from(DEFAULT_SOURCES_PATH);
            default.exists().then_some(default)
        }
    };

    let Some(path) = candidate else {
        return builtin_sources();
    };

    match load_sources_from(&path) {
        Ok(list) if !list.is_empty() => list,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "sources file is empty, using built-ins");
            builtin_sources()
        }
        Err(e) => {
            tracing::warn!(error = ?e, path = %path.display(), "sources file unreadable, using built-ins");
            builtin_sources()
        }
    }
}
