//! Metrics collection for the query server
//!
//! Prometheus metrics for HTTP traffic and for how each requested view was
//! served.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

lazy_static! {
    // HTTP Request Metrics

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "lensing_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "lensing_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    /// In-flight HTTP requests
    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "lensing_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    // Query Metrics

    /// Queries handled, by outcome (ok, rejected)
    pub static ref QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "lensing_queries_total",
        "Total number of queries handled",
        &["status"]
    )
    .expect("Failed to register QUERIES_TOTAL");

    /// Query handling duration
    pub static ref QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "lensing_query_duration_seconds",
        "Query handling duration in seconds",
        &["status"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]
    )
    .expect("Failed to register QUERY_DURATION_SECONDS");

    /// Views served, by view type and source (cache, result_cache, computed, error)
    pub static ref VIEWS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "lensing_views_total",
        "Total number of views served",
        &["view_type", "source"]
    )
    .expect("Failed to register VIEWS_TOTAL");

    /// Entries held per cache
    pub static ref CACHE_ENTRIES: IntGaugeVec = register_int_gauge_vec!(
        "lensing_cache_entries",
        "Number of entries held in each cache",
        &["cache"]
    )
    .expect("Failed to register CACHE_ENTRIES");
}

/// Collapse a request path onto a known route to bound label cardinality.
pub fn sanitize_path(path: &str) -> String {
    match path {
        "/" | "/query" | "/health" | "/metrics" => path.to_string(),
        _ => "other".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/query"), "/query");
        assert_eq!(sanitize_path("/health"), "/health");
        assert_eq!(sanitize_path("/query/../etc"), "other");
        assert_eq!(sanitize_path("/favicon.ico"), "other");
    }
}
