//! Prometheus metrics for conversions.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ffconv_conversions_total", "Total ffmpeg conversions"),
        &["result"], // "success", "failed", "cancelled"
    )
    .expect("valid conversions_total metric")
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ffconv_conversion_duration_seconds",
            "Wall-clock duration of ffmpeg conversions",
        )
        .buckets(vec![
            0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
        ]),
        &["result"],
    )
    .expect("valid conversion_duration metric")
});

/// Failed conversions by error kind.
pub static CONVERSION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ffconv_conversion_failures_total",
            "Failed conversions by error kind",
        ),
        &["kind"],
    )
    .expect("valid conversion_failures metric")
});

/// Records the outcome of one conversion run.
pub fn record_conversion(result: &str, duration_secs: f64) {
    CONVERSIONS_TOTAL.with_label_values(&[result]).inc();
    CONVERSION_DURATION
        .with_label_values(&[result])
        .observe(duration_secs);
}

pub fn record_failure(kind: &str) {
    CONVERSION_FAILURES.with_label_values(&[kind]).inc();
}

/// Get all metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(CONVERSION_FAILURES.clone()),
    ]
}
