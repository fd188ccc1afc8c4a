//! Artificial latency layer for local latency testing.

use axum::{body::Body, http::Request, middleware::Next, response::IntoResponse};
use std::time::Duration;

const SLOWDOWN_MS: u64 = 750;

pub async fn slowdown_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    tokio::time::sleep(Duration::from_millis(SLOWDOWN_MS)).await;
    next.run(request).await
}
