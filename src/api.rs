use std::sync::Arc;

use metrics::counter;
use shuttle_axum::axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::aggregator::fetch::HttpFeedFetcher;
use crate::aggregator::types::{Article, FeedFetch, SourceDescriptor};
use crate::aggregator::{aggregate, sources, AggregateOptions};
use crate::config::{
    AppConfig, DEFAULT_NEWS_PAGE_SIZE, MAX_NEWS_PAGE_SIZE, TRENDING_MIN_PER_SOURCE,
    TRENDING_SNIPPET_CHARS, TRENDING_TOTAL_LIMIT, UPDATES_SNIPPET_CHARS,
};
use crate::stats::{self, StatsCache};

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn FeedFetch>,
    pub sources: Arc<Vec<SourceDescriptor>>,
    pub config: Arc<AppConfig>,
    pub stats_cache: StatsCache,
    pub stats_client: reqwest::Client,
}

impl AppState {
    pub fn from_env() -> Self {
        let config = AppConfig::from_env();
        let fetcher = Arc::new(HttpFeedFetcher::new(config.fetch_timeout));
        Self::with_parts(fetcher, sources::load_sources(), config)
    }

    /// Assembly seam for tests: any fetcher and registry can be injected.
    pub fn with_parts(
        fetcher: Arc<dyn FeedFetch>,
        sources: Vec<SourceDescriptor>,
        config: AppConfig,
    ) -> Self {
        Self {
            fetcher,
            sources: Arc::new(sources),
            config: Arc::new(config),
            stats_cache: stats::new_cache(),
            stats_client: reqwest::Client::new(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/updates", get(get_updates))
        .route("/api/news", get(get_news))
        .route("/api/trending", get(get_trending))
        .route("/api/stats", get(get_stats))
        .layer(CatchPanicLayer::custom(render_panic))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Any panic unwinding out of a handler becomes the generic 500 body.
/// Per-source fetch problems never get this far; they are absorbed inside
/// the aggregation pipeline.
pub fn render_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("request handler panicked");
    counter!("news_pipeline_failures_total").increment(1);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "news aggregation failed" })),
    )
        .into_response()
}

/// `Cache-Control` for the aggregation endpoints: shared caches may serve
/// the payload for `max_age_secs` and revalidate in the background.
fn cache_control(max_age_secs: u64) -> [(HeaderName, String); 1] {
    [(
        header::CACHE_CONTROL,
        format!("s-maxage={max_age_secs}, stale-while-revalidate"),
    )]
}

fn updates_options(cfg: &AppConfig) -> AggregateOptions {
    AggregateOptions {
        min_per_source: cfg.min_per_source,
        total_limit: cfg.total_limit,
        snippet_max_chars: UPDATES_SNIPPET_CHARS,
        fetch_timeout: cfg.fetch_timeout,
    }
}

fn trending_options(cfg: &AppConfig) -> AggregateOptions {
    AggregateOptions {
        min_per_source: TRENDING_MIN_PER_SOURCE,
        total_limit: TRENDING_TOTAL_LIMIT,
        snippet_max_chars: TRENDING_SNIPPET_CHARS,
        fetch_timeout: cfg.fetch_timeout,
    }
}

#[derive(serde::Serialize)]
struct UpdatesResponse {
    updates: Vec<Article>,
}

async fn get_updates(State(state): State<AppState>) -> impl IntoResponse {
    counter!("news_requests_total").increment(1);
    let updates = aggregate(
        state.fetcher.clone(),
        &state.sources,
        updates_options(&state.config),
    )
    .await;

    (
        cache_control(state.config.cache_max_age_secs),
        Json(UpdatesResponse { updates }),
    )
}

#[derive(serde::Deserialize)]
struct NewsParams {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct NewsResponse {
    articles: Vec<Article>,
    total: usize,
    has_more: bool,
}

async fn get_news(
    State(state): State<AppState>,
    Query(params): Query<NewsParams>,
) -> impl IntoResponse {
    counter!("news_requests_total").increment(1);
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_NEWS_PAGE_SIZE)
        .clamp(1, MAX_NEWS_PAGE_SIZE);

    let all = aggregate(
        state.fetcher.clone(),
        &state.sources,
        updates_options(&state.config),
    )
    .await;

    let total = all.len();
    let start = (page - 1).saturating_mul(limit);
    let articles: Vec<Article> = all.into_iter().skip(start).take(limit).collect();
    let has_more = page.saturating_mul(limit) < total;

    (
        cache_control(state.config.cache_max_age_secs),
        Json(NewsResponse {
            articles,
            total,
            has_more,
        }),
    )
}

#[derive(serde::Serialize)]
struct TrendingResponse {
    items: Vec<Article>,
}

async fn get_trending(State(state): State<AppState>) -> impl IntoResponse {
    counter!("news_requests_total").increment(1);
    let items = aggregate(
        state.fetcher.clone(),
        &state.sources,
        trending_options(&state.config),
    )
    .await;

    (
        cache_control(state.config.cache_max_age_secs),
        Json(TrendingResponse { items }),
    )
}

async fn get_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let doc = stats::stats_document(
        &state.stats_cache,
        &state.stats_client,
        state.config.stats_upstream_url.as_deref(),
        state.config.stats_ttl,
    )
    .await;
    Json(doc)
}
