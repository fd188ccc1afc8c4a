//! Test server lifecycle management.
//!
//! Spawns the real gateway router on an ephemeral port, backed by in-process
//! demo providers and the deterministic test engine. Each test gets an
//! isolated gateway.

use std::sync::Arc;

use agent_gateway::gateway::{Gateway, GatewayOptions};
use agent_gateway::mcp::ProviderEndpoint;
use agent_gateway::server::server::make_app;
use agent_gateway::server::state::ServerState;
use agent_gateway::server::ServerConfig;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::llm::ArithmeticEngine;
use super::provider::{dead_endpoint, TestProvider};

/// Test server instance with its own gateway and providers.
///
/// When dropped, the HTTP server and the providers shut down.
pub struct TestServer {
    /// Base URL for making requests (e.g. "http://127.0.0.1:12345").
    pub base_url: String,

    /// The port the server is listening on.
    pub port: u16,

    /// The gateway, exposed so tests can drive its lifecycle directly.
    pub gateway: Arc<Gateway>,

    // Private fields - keep resources alive until drop
    _providers: Vec<TestProvider>,
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestServer {
    /// Spawns a ready gateway backed by one arithmetic provider.
    ///
    /// # Panics
    ///
    /// Panics if startup fails; that indicates a test infrastructure problem.
    pub async fn spawn() -> Self {
        let provider = TestProvider::spawn().await;
        let endpoints = vec![provider.endpoint("calc")];

        let server = Self::spawn_with(endpoints, vec![provider]).await;
        server
            .gateway
            .start()
            .await
            .expect("Gateway startup failed");
        server
    }

    /// Spawns a gateway whose only provider is unreachable, then lets its
    /// startup fail. The HTTP surface is up, the gateway never gets ready.
    pub async fn spawn_unready() -> Self {
        let server = Self::spawn_with(vec![dead_endpoint("ghost")], Vec::new()).await;
        server
            .gateway
            .start()
            .await
            .expect_err("Startup against a dead provider must fail");
        assert!(!server.gateway.is_ready());
        server
    }

    /// Spawns the HTTP surface over a fresh, not-yet-started gateway.
    pub async fn spawn_with(
        endpoints: Vec<ProviderEndpoint>,
        providers: Vec<TestProvider>,
    ) -> Self {
        let options = GatewayOptions {
            provider_call_timeout: std::time::Duration::from_secs(5),
            ..GatewayOptions::default()
        };
        let gateway = Arc::new(Gateway::new(
            endpoints,
            Arc::new(ArithmeticEngine),
            options,
        ));

        let state = ServerState::new(ServerConfig::default(), gateway.clone());
        let app = make_app(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind server port");
        let port = listener.local_addr().expect("No local addr").port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Gateway server failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            port,
            gateway,
            _providers: providers,
            _shutdown_tx: shutdown_tx,
        }
    }
}
