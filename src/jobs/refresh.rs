//! Cache Refresh Background Job
//!
//! Recomputes the most-requested rankings on a fixed interval so those
//! cache entries stay warm and a client never pays for a cold compute:
//!
//! 1. Top rankings at the fixed age windows (default 72h, 168h, 720h)
//! 2. The trending ranking
//!
//! Each recomputation is independent. A failing window is logged and
//! skipped; it never aborts the remaining recomputations or the loop.

use crate::metrics::refresh as metrics;
use crate::services::ranking::RankingService;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// How often to refresh the hot rankings (every 7 minutes)
const REFRESH_INTERVAL: Duration = Duration::from_secs(7 * 60);

/// Delay before the first cycle, to let the pool settle at startup
const STARTUP_DELAY: Duration = Duration::from_secs(15);

/// Age windows (hours) kept warm for the top ranking
const TOP_AGE_HOURS: [i64; 3] = [72, 168, 720];

/// Configuration for the refresh scheduler
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub enabled: bool,
    pub interval: Duration,
    pub startup_delay: Duration,
    pub top_age_hours: Vec<i64>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: REFRESH_INTERVAL,
            startup_delay: STARTUP_DELAY,
            top_age_hours: TOP_AGE_HOURS.to_vec(),
        }
    }
}

impl RefreshConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("REFRESH_ENABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enabled),
            interval: std::env::var("REFRESH_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            startup_delay: std::env::var("REFRESH_STARTUP_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.startup_delay),
            top_age_hours: std::env::var("REFRESH_TOP_AGE_HOURS")
                .ok()
                .map(|raw| {
                    raw.split(',')
                        .filter_map(|v| v.trim().parse().ok())
                        .collect::<Vec<i64>>()
                })
                .filter(|ages| !ages.is_empty())
                .unwrap_or(defaults.top_age_hours),
        }
    }
}

/// Start the refresh scheduler background job
pub async fn start_refresh_scheduler(service: RankingService, config: RefreshConfig) {
    if !config.enabled {
        tracing::info!("Ranking refresh scheduler disabled by configuration");
        return;
    }

    tracing::info!(
        interval_secs = config.interval.as_secs(),
        top_age_hours = ?config.top_age_hours,
        "Starting ranking refresh background job"
    );

    sleep(config.startup_delay).await;

    loop {
        let cycle_start = Instant::now();

        run_refresh_cycle(&service, &config).await;

        metrics::record_cycle_duration(cycle_start.elapsed());
        tracing::info!(
            duration_ms = cycle_start.elapsed().as_millis(),
            "Ranking refresh cycle completed"
        );

        sleep(config.interval).await;
    }
}

/// Run one refresh cycle. Failures are isolated per window/mode.
async fn run_refresh_cycle(service: &RankingService, config: &RefreshConfig) {
    for &age_hours in &config.top_age_hours {
        match service.refresh_top(age_hours).await {
            Ok(count) => {
                metrics::record_refresh("top", "success");
                tracing::debug!(age_hours, posts = count, "Refreshed top ranking");
            }
            Err(e) => {
                metrics::record_refresh("top", "error");
                tracing::warn!(
                    age_hours,
                    error = %e,
                    "Top ranking refresh failed, skipping window"
                );
            }
        }
    }

    match service.refresh_trending().await {
        Ok(count) => {
            metrics::record_refresh("trending", "success");
            tracing::debug!(posts = count, "Refreshed trending ranking");
        }
        Err(e) => {
            metrics::record_refresh("trending", "error");
            tracing::warn!(error = %e, "Trending refresh failed, skipping");
        }
    }
}
