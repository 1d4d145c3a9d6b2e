//! Refresh Scheduler Metrics
//!
//! Prometheus metrics for the background cache refresh job

use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter_vec, Histogram, IntCounterVec};
use std::time::Duration;

static REFRESH_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "ranking_refresh_total",
        "Ranking refresh attempts by mode and outcome",
        &["mode", "status"]
    )
    .expect("Failed to register ranking refresh metric")
});

static REFRESH_CYCLE_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ranking_refresh_cycle_duration_seconds",
        "Duration of a full ranking refresh cycle",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to register ranking refresh cycle duration metric")
});

/// Record one refresh attempt (mode: top/trending, status: success/error)
pub fn record_refresh(mode: &str, status: &str) {
    REFRESH_TOTAL.with_label_values(&[mode, status]).inc();
}

/// Record the duration of a full refresh cycle
pub fn record_cycle_duration(duration: Duration) {
    REFRESH_CYCLE_DURATION_SECONDS.observe(duration.as_secs_f64());
}
