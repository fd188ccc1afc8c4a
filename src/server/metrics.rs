//! Prometheus metrics.
//!
//! All metrics live in one registry, served by a dedicated listener on the
//! metrics port so scrapes never compete with gateway traffic.

use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tracing::{error, info};

/// Metric name prefix for all gateway metrics
const PREFIX: &str = "agent_gateway";

lazy_static! {
    // Global Prometheus registry
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
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Chat Metrics
    pub static ref CHAT_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_chat_requests_total"), "Total chat requests by outcome"),
        &["outcome"]
    ).expect("Failed to create chat_requests_total metric");

    pub static ref CHAT_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_chat_duration_seconds"),
            "End-to-end chat handling duration in seconds"
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["outcome"]
    ).expect("Failed to create chat_duration_seconds metric");

    // Provider Metrics
    pub static ref TOOL_INVOCATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_tool_invocations_total"), "Tool invocations by provider"),
        &["provider", "tool", "status"]
    ).expect("Failed to create tool_invocations_total metric");
}

/// Register all metrics with the global registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(CHAT_REQUESTS_TOTAL.clone()),
        Box::new(CHAT_DURATION_SECONDS.clone()),
        Box::new(TOOL_INVOCATIONS_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            // Double registration only happens in tests; not fatal.
            error!("Failed to register metric: {}", e);
        }
    }
}

/// Record one handled HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record one chat request with its outcome ("answered", "refused", "failed").
pub fn record_chat_request(outcome: &str, duration: Duration) {
    CHAT_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    CHAT_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Record one tool invocation against a provider.
pub fn record_tool_invocation(provider: &str, tool: &str, success: bool) {
    let status = if success { "ok" } else { "error" };
    TOOL_INVOCATIONS_TOTAL
        .with_label_values(&[provider, tool, status])
        .inc();
}

async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&REGISTRY.gather(), &mut buffer) {
        Ok(()) => (StatusCode::OK, buffer).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serve `/metrics` on its own port until the process exits.
pub async fn run_metrics_server(port: u16) -> anyhow::Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!(port = port, "Metrics server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_helpers_do_not_panic() {
        register_metrics();
        record_http_request("POST", "/chat", 200, Duration::from_millis(12));
        record_chat_request("answered", Duration::from_millis(300));
        record_tool_invocation("calc", "add", true);
        record_tool_invocation("calc", "divide", false);

        let families = REGISTRY.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "agent_gateway_http_requests_total"));
    }
}
