// src/stats.rs
//! Usage-stats endpoint backing: one upstream JSON document behind an
//! explicit TTL cache. The cache is injected through `AppState`, read
//! first, and overwritten whole on refresh. On upstream failure the stale
//! value is served; with nothing cached yet, a shipped baseline document.

use anyhow::{Context, Result};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("stats_cache_hits_total", "Stats served from the TTL cache.");
        describe_counter!("stats_cache_misses_total", "Stats cache misses or expiries.");
        describe_counter!("stats_upstream_errors_total", "Stats upstream fetch failures.");
    });
}

#[derive(Debug, Clone)]
pub struct CachedStats {
    pub value: serde_json::Value,
    pub fetched_at_ms: u64,
}

impl CachedStats {
    pub fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.fetched_at_ms) >= ttl.as_millis() as u64
    }
}

pub type StatsCache = Arc<RwLock<Option<CachedStats>>>;

pub fn new_cache() -> StatsCache {
    Arc::new(RwLock::new(None))
}

pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Curated snapshot served until the first successful upstream fetch.
pub fn baseline_stats() -> serde_json::Value {
    serde_json::json!({
        "aiToolsTracked": 1287,
        "modelReleasesThisYear": 42,
        "chatgptWeeklyUsers": 800_000_000u64,
        "lastRefreshed": "2025-06-30",
    })
}

async fn fetch_stats(client: &reqwest::Client, url: &str) -> Result<serde_json::Value> {
    let resp = client
        .get(url)
        .send()
        .await
        .context("stats upstream get")?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("stats upstream responded with status {status}");
    }
    resp.json().await.context("stats upstream json")
}

/// Resolve the stats document: fresh cache value, else refetch and
/// overwrite, else stale value, else baseline.
pub async fn stats_document(
    cache: &StatsCache,
    client: &reqwest::Client,
    upstream_url: Option<&str>,
    ttl: Duration,
) -> serde_json::Value {
    ensure_metrics_described();
    let now = now_ms();

    if let Some(hit) = cache.read().await.as_ref() {
        if !hit.is_expired(now, ttl) {
            counter!("stats_cache_hits_total").increment(1);
            return hit.value.clone();
        }
    }
    // No upstream configured means baseline mode, not a failure: serve
    // whatever was cached last, else the shipped snapshot, without touching
    // the miss/error counters.
    let Some(url) = upstream_url else {
        return match cache.read().await.as_ref() {
            Some(stale) => stale.value.clone(),
            None => baseline_stats(),
        };
    };
    counter!("stats_cache_misses_total").increment(1);

    match fetch_stats(client, url).await {
        Ok(value) => {
            let mut guard = cache.write().await;
            *guard = Some(CachedStats {
                value: value.clone(),
                fetched_at_ms: now,
            });
            value
        }
        Err(e) => {
            tracing::warn!(error = ?e, "stats upstream unavailable, serving stale or baseline");
            counter!("stats_upstream_errors_total").increment(1);
            match cache.read().await.as_ref() {
                Some(stale) => stale.value.clone(),
                None => baseline_stats(),
            }
        }
    }
}
