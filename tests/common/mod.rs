//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests:
//! in-process demo tool providers, a scripted reasoning engine, and a real
//! gateway server on an ephemeral port. Tests should only import from this
//! module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestClient, TestServer};
//!
//! #[tokio::test]
//! async fn test_chat() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.chat("what is 2 plus 3").await;
//!     assert_eq!(response.status(), reqwest::StatusCode::OK);
//! }
//! ```

mod client;
mod llm;
mod provider;
mod server;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use llm::ArithmeticEngine;
#[allow(unused_imports)]
pub use provider::{dead_endpoint, TestProvider};
#[allow(unused_imports)]
pub use server::TestServer;
