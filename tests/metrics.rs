// tests/metrics.rs
use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use ai_news_aggregator::config::AppConfig;
use ai_news_aggregator::metrics::Metrics;
use ai_news_aggregator::{create_router, AppState, FeedFetch, RawFeedEntry, SourceDescriptor};

struct StubFetcher {
    feeds: HashMap<String, Vec<RawFeedEntry>>,
}

#[async_trait::async_trait]
impl FeedFetch for StubFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<RawFeedEntry>> {
        match self.feeds.get(url) {
            Some(entries) => Ok(entries.clone()),
            None => anyhow::bail!("unreachable host"),
        }
    }
}

// Single test on purpose: the Prometheus recorder installs into a global
// and a second install in the same process would panic.
#[tokio::test]
async fn metrics_endpoint_contains_expected_series() {
    let good = SourceDescriptor {
        id: "alive".into(),
        display_name: "Alive".into(),
        primary_url: "https://feeds.test/alive.xml".into(),
        secondary_url: None,
        logo_url: "/logos/alive.png".into(),
        quirk: None,
    };
    let broken = SourceDescriptor {
        id: "down".into(),
        display_name: "Down".into(),
        primary_url: "https://feeds.test/down.xml".into(),
        secondary_url: None,
        logo_url: "/logos/down.png".into(),
        quirk: None,
    };

    let mut feeds = HashMap::new();
    feeds.insert(
        good.primary_url.clone(),
        vec![RawFeedEntry {
            title: Some("One visible article".into()),
            link: Some("https://feeds.test/alive/one".into()),
            published_at: Some("2025-05-01T10:00:00Z".into()),
            snippet: Some("Enough text to make a usable snippet.".into()),
            ..Default::default()
        }],
    );

    let metrics = Metrics::init(300);
    let fetcher: Arc<dyn FeedFetch> = Arc::new(StubFetcher { feeds });
    let app = create_router(AppState::with_parts(
        fetcher,
        vec![good, broken],
        AppConfig::default(),
    ))
    .merge(metrics.router());

    // Drive one aggregation pass so the request counters move.
    let resp = app
        .clone()
        .oneshot(Request::get("/api/updates").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let m = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(m.status(), StatusCode::OK);
    let bytes = body::to_bytes(m.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    for needle in [
        "news_cache_max_age_secs",
        "news_requests_total",
        "news_pipeline_ms",
        "news_fetch_errors_total",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
