//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "shorts_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "shorts_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "shorts_http_requests_in_flight";

    // Generation pipeline
    pub const GENERATIONS_TOTAL: &str = "shorts_generations_total";

    // Signed URL cache
    pub const SIGNED_ACCESS_TOTAL: &str = "shorts_signed_access_total";
    pub const SIGNED_SWEEPS_TOTAL: &str = "shorts_signed_sweeps_total";
    pub const SIGNED_URLS_CLEARED_TOTAL: &str = "shorts_signed_urls_cleared_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished generation by outcome.
pub fn record_generation(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::GENERATIONS_TOTAL, &labels).increment(1);
}

/// Record a signed URL read by the cache state it found.
pub fn record_signed_access(state: &str) {
    let labels = [("state", state.to_string())];
    counter!(names::SIGNED_ACCESS_TOTAL, &labels).increment(1);
}

/// Record a sweep pass; `None` marks a failed pass.
pub fn record_sweep(cleared: Option<u64>) {
    let outcome = if cleared.is_some() { "success" } else { "failure" };
    counter!(names::SIGNED_SWEEPS_TOTAL, "outcome" => outcome).increment(1);
    if let Some(cleared) = cleared {
        counter!(names::SIGNED_URLS_CLEARED_TOTAL).increment(cleared);
    }
}

fn path_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"/generations/[^/]+", "/generations/:generation_id"),
            (r"/[0-9]+(/|$)", "/:id$1"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
        .collect()
    })
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    path_patterns()
        .iter()
        .fold(path.to_string(), |path, (re, replacement)| {
            re.replace_all(&path, *replacement).into_owned()
        })
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/generations/550e8400-e29b-41d4-a716-446655440000/signed-urls"),
            "/api/generations/:generation_id/signed-urls"
        );
        assert_eq!(sanitize_path("/api/generations"), "/api/generations");
        assert_eq!(sanitize_path("/items/42"), "/items/:id");
        assert_eq!(sanitize_path("/health"), "/health");
    }
}
