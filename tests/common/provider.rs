//! In-process demo tool provider for tests.
//!
//! Serves the crate's bundled arithmetic MCP provider on an ephemeral port,
//! exactly as the `demo-provider` binary would.

use agent_gateway::mcp::ProviderEndpoint;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One running tool provider.
///
/// The provider shuts down when the struct is dropped.
pub struct TestProvider {
    /// Base URL the gateway should connect to.
    pub base_url: String,

    /// The port the provider is listening on.
    pub port: u16,

    // Dropping the sender resolves the shutdown future.
    _shutdown_tx: oneshot::Sender<()>,
}

impl TestProvider {
    /// Spawns the arithmetic provider on a random port.
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind provider port");
        let port = listener.local_addr().expect("No local addr").port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, agent_gateway::demo::router())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Provider server failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            port,
            _shutdown_tx: shutdown_tx,
        }
    }

    /// Endpoint pointing at this provider.
    pub fn endpoint(&self, id: &str) -> ProviderEndpoint {
        ProviderEndpoint {
            id: id.to_string(),
            base_url: self.base_url.clone(),
        }
    }
}

/// An endpoint nobody listens on, for connection-failure tests.
pub fn dead_endpoint(id: &str) -> ProviderEndpoint {
    ProviderEndpoint {
        id: id.to_string(),
        base_url: "http://127.0.0.1:9".to_string(),
    }
}
