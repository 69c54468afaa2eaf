// src/aggregator/mod.rs
pub mod assemble;
pub mod fetch;
pub mod normalize;
pub mod repair;
pub mod sources;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

use crate::aggregator::types::{Article, FeedFetch, RawFeedEntry, SourceDescriptor};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_entries_total", "Raw entries parsed from feeds.");
        describe_counter!("news_fetch_errors_total", "Feed fetch/parse failures.");
        describe_counter!(
            "news_fetch_timeouts_total",
            "Feed fetches that exceeded the per-source deadline."
        );
        describe_counter!("news_requests_total", "Aggregation requests served.");
        describe_counter!(
            "news_pipeline_failures_total",
            "Aggregation passes that died and were rendered as a 500."
        );
        describe_histogram!("news_parse_ms", "Feed parse time in milliseconds.");
        describe_histogram!("news_pipeline_ms", "Full aggregation pass in milliseconds.");
    });
}

/// Bounds for one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    pub min_per_source: usize,
    pub total_limit: usize,
    pub snippet_max_chars: usize,
    pub fetch_timeout: Duration,
}

/// Fetch a single feed URL with the per-source deadline. Every failure mode
/// (network, status, parse, timeout) collapses into an empty contribution;
/// one broken source must never take the whole response down.
async fn fetch_soft(
    fetcher: &dyn FeedFetch,
    source: &SourceDescriptor,
    url: &str,
    deadline: Duration,
) -> Vec<RawFeedEntry> {
    match tokio::time::timeout(deadline, fetcher.fetch(url)).await {
        Ok(Ok(entries)) => entries,
        Ok(Err(e)) => {
            tracing::warn!(error = ?e, source = %source.id, url, "feed fetch failed");
            counter!("news_fetch_errors_total").increment(1);
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(
                source = %source.id,
                url,
                deadline_secs = deadline.as_secs(),
                "feed fetch timed out"
            );
            counter!("news_fetch_timeouts_total").increment(1);
            Vec::new()
        }
    }
}

fn normalize_entries(
    source: &SourceDescriptor,
    raw: Vec<RawFeedEntry>,
    snippet_max_chars: usize,
) -> Vec<Article> {
    raw.iter()
        .filter_map(|entry| normalize::normalize_entry(source, entry, snippet_max_chars))
        .collect()
}

/// Primary and secondary feeds for one source, fetched concurrently, then
/// normalized, title-deduped and link-deduped into one newest-first list.
async fn collect_source(
    fetcher: &dyn FeedFetch,
    source: &SourceDescriptor,
    opts: AggregateOptions,
) -> Vec<Article> {
    let (primary_raw, secondary_raw) = tokio::join!(
        fetch_soft(fetcher, source, &source.primary_url, opts.fetch_timeout),
        async {
            match source.secondary_url.as_deref() {
                Some(url) => fetch_soft(fetcher, source, url, opts.fetch_timeout).await,
                None => Vec::new(),
            }
        }
    );

    let primary = normalize_entries(source, primary_raw, opts.snippet_max_chars);
    let secondary = normalize_entries(source, secondary_raw, opts.snippet_max_chars);
    let merged = assemble::merge_primary_secondary(primary, secondary);
    assemble::dedup_by_link(merged)
}

/// Run the full aggregation pass: one task per source, all awaited before
/// assembly. A panicking source task is contained like any other source
/// failure.
pub async fn aggregate(
    fetcher: Arc<dyn FeedFetch>,
    sources: &[SourceDescriptor],
    opts: AggregateOptions,
) -> Vec<Article> {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let mut handles = Vec::with_capacity(sources.len());
    for source in sources {
        let fetcher = Arc::clone(&fetcher);
        let source = source.clone();
        handles.push(tokio::spawn(async move {
            collect_source(fetcher.as_ref(), &source, opts).await
        }));
    }

    let mut per_source = Vec::with_capacity(handles.len());
    for (handle, source) in handles.into_iter().zip(sources) {
        match handle.await {
            Ok(list) => per_source.push(list),
            Err(e) => {
                tracing::warn!(error = ?e, source = %source.id, "source task failed");
                counter!("news_fetch_errors_total").increment(1);
                per_source.push(Vec::new());
            }
        }
    }

    let result = assemble::assemble_balanced(per_source, opts.min_per_source, opts.total_limit);
    histogram!("news_pipeline_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    result
}
