use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all box office metrics
const PREFIX: &str = "boxoffice";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Prediction Metrics
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_predictions_total"), "Total number of movie predictions"),
        &["outcome"]
    ).expect("Failed to create predictions_total metric");

    pub static ref ATTRIBUTION_FAILURES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_attribution_failures_total"),
        "Predictions returned without feature attributions"
    ).expect("Failed to create attribution_failures_total metric");

    pub static ref CALIBRATION_CORRECTIONS_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_calibration_corrections_total"),
        "Opening weekend predictions dampened by the correction policy"
    ).expect("Failed to create calibration_corrections_total metric");

    // Media Metrics
    pub static ref MEDIA_LOOKUPS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_media_lookups_total"), "Media lookups by cache result"),
        &["result"]
    ).expect("Failed to create media_lookups_total metric");
}

pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ATTRIBUTION_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CALIBRATION_CORRECTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(MEDIA_LOOKUPS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// `outcome` is "full" or "degraded".
pub fn record_prediction(outcome: &str) {
    PREDICTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_attribution_failure() {
    ATTRIBUTION_FAILURES_TOTAL.inc();
}

pub fn record_calibration_correction() {
    CALIBRATION_CORRECTIONS_TOTAL.inc();
}

/// `result` is "hit", "miss" or "failed".
pub fn record_media_lookup(result: &str) {
    MEDIA_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

/// Handler for the Prometheus scrape endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
