// src/config.rs
//! Runtime configuration from environment variables with safe defaults.
//! Bad values are logged and ignored rather than failing startup.

use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_MIN_PER_SOURCE: usize = 5;
pub const DEFAULT_TOTAL_LIMIT: usize = 60;
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 300;
pub const DEFAULT_STATS_TTL_SECS: u64 = 3600;

pub const ENV_FETCH_TIMEOUT_SECS: &str = "NEWS_FETCH_TIMEOUT_SECS";
pub const ENV_MIN_PER_SOURCE: &str = "NEWS_MIN_PER_SOURCE";
pub const ENV_TOTAL_LIMIT: &str = "NEWS_TOTAL_LIMIT";
pub const ENV_CACHE_MAX_AGE_SECS: &str = "NEWS_CACHE_MAX_AGE_SECS";
pub const ENV_STATS_TTL_SECS: &str = "STATS_CACHE_TTL_SECS";
pub const ENV_STATS_UPSTREAM_URL: &str = "STATS_UPSTREAM_URL";

/// Snippet bound for the updates/news payloads, in characters.
pub const UPDATES_SNIPPET_CHARS: usize = 200;

// Trending runs the same pipeline with tighter fixed bounds.
pub const TRENDING_SNIPPET_CHARS: usize = 140;
pub const TRENDING_MIN_PER_SOURCE: usize = 2;
pub const TRENDING_TOTAL_LIMIT: usize = 12;

// News pagination bounds.
pub const DEFAULT_NEWS_PAGE_SIZE: usize = 10;
pub const MAX_NEWS_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fetch_timeout: Duration,
    pub min_per_source: usize,
    pub total_limit: usize,
    pub cache_max_age_secs: u64,
    pub stats_ttl: Duration,
    pub stats_upstream_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            min_per_source: DEFAULT_MIN_PER_SOURCE,
            total_limit: DEFAULT_TOTAL_LIMIT,
            cache_max_age_secs: DEFAULT_CACHE_MAX_AGE_SECS,
            stats_ttl: Duration::from_secs(DEFAULT_STATS_TTL_SECS),
            stats_upstream_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(env_u64(
                ENV_FETCH_TIMEOUT_SECS,
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
            min_per_source: env_usize(ENV_MIN_PER_SOURCE, DEFAULT_MIN_PER_SOURCE),
            total_limit: env_usize(ENV_TOTAL_LIMIT, DEFAULT_TOTAL_LIMIT),
            cache_max_age_secs: env_u64(ENV_CACHE_MAX_AGE_SECS, DEFAULT_CACHE_MAX_AGE_SECS),
            stats_ttl: Duration::from_secs(env_u64(ENV_STATS_TTL_SECS, DEFAULT_STATS_TTL_SECS)),
            stats_upstream_url: std::env::var(ENV_STATS_UPSTREAM_URL)
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "ignoring unparseable env value");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(var = name, value = %raw, "ignoring unparseable env value");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn clear_all() {
        for var in [
            ENV_FETCH_TIMEOUT_SECS,
            ENV_MIN_PER_SOURCE,
            ENV_TOTAL_LIMIT,
            ENV_CACHE_MAX_AGE_SECS,
            ENV_STATS_TTL_SECS,
            ENV_STATS_UPSTREAM_URL,
        ] {
            env::remove_var(var);
        }
    }

    #[serial_test::serial]
    #[test]
    fn defaults_apply_when_env_is_empty() {
        clear_all();
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(8));
        assert_eq!(cfg.min_per_source, 5);
        assert_eq!(cfg.total_limit, 60);
        assert_eq!(cfg.cache_max_age_secs, 300);
        assert_eq!(cfg.stats_ttl, Duration::from_secs(3600));
        assert!(cfg.stats_upstream_url.is_none());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_apply() {
        clear_all();
        env::set_var(ENV_FETCH_TIMEOUT_SECS, "3");
        env::set_var(ENV_TOTAL_LIMIT, "12");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(3));
        assert_eq!(cfg.total_limit, 12);
        clear_all();
    }

    #[serial_test::serial]
    #[test]
    fn garbage_values_fall_back_to_defaults() {
        clear_all();
        env::set_var(ENV_MIN_PER_SOURCE, "many");
        env::set_var(ENV_CACHE_MAX_AGE_SECS, "-1");
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.min_per_source, DEFAULT_MIN_PER_SOURCE);
        assert_eq!(cfg.cache_max_age_secs, DEFAULT_CACHE_MAX_AGE_SECS);
        clear_all();
    }
}
