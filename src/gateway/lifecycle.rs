//! Gateway lifecycle management.
//!
//! Startup is all-or-nothing: every configured provider must connect and
//! deliver its catalog before the gateway becomes ready, because an agent
//! with a silently incomplete toolset would mislead the reasoning engine
//! about what it can do. Teardown runs in reverse: stop accepting requests,
//! disconnect every provider (best effort), release the agent.
//!
//! Phases: `Uninitialized → Starting → Ready → Draining → Stopped`. A failed
//! startup never reaches `Ready`; the process is expected to exit.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{error, info};

use crate::agent::llm::LlmProvider;
use crate::agent::orchestrator::{AgentError, AgentOrchestrator};
use crate::agent::tools::{AgentTool, RegistryError, RemoteTool, ToolRegistry};
use crate::mcp::connection::{
    CatalogError, ConnectionError, ProviderConnection, ProviderEndpoint,
};

/// Process-wide lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPhase {
    Uninitialized,
    Starting,
    Ready,
    Draining,
    Stopped,
}

impl std::fmt::Display for GatewayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GatewayPhase::Uninitialized => "uninitialized",
            GatewayPhase::Starting => "starting",
            GatewayPhase::Ready => "ready",
            GatewayPhase::Draining => "draining",
            GatewayPhase::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}

/// Fatal startup errors. Any of these aborts the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Provider connection failed")]
    Connection(#[from] ConnectionError),

    #[error("Provider catalog fetch failed")]
    Catalog(#[from] CatalogError),

    #[error("Tool aggregation failed")]
    Registry(#[from] RegistryError),

    #[error("Agent construction failed")]
    Agent(#[from] AgentError),

    #[error("Gateway cannot start from the {0} phase")]
    InvalidPhase(GatewayPhase),
}

/// Tunables applied when the agent is built.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Policy text for the agent.
    pub system_prompt: String,
    /// Timeout bounding every provider round trip.
    pub provider_call_timeout: Duration,
    /// Bound on engine round trips per request.
    pub max_iterations: usize,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            system_prompt: crate::agent::orchestrator::DEFAULT_SYSTEM_PROMPT.to_string(),
            provider_call_timeout: Duration::from_secs(30),
            max_iterations: 10,
        }
    }
}

/// Owns the provider connections and the agent, and sequences their
/// startup and teardown.
pub struct Gateway {
    connections: Vec<Arc<ProviderConnection>>,
    llm: Arc<dyn LlmProvider>,
    options: GatewayOptions,
    phase: Mutex<GatewayPhase>,
    orchestrator: RwLock<Option<Arc<AgentOrchestrator>>>,
}

impl Gateway {
    pub fn new(
        endpoints: Vec<ProviderEndpoint>,
        llm: Arc<dyn LlmProvider>,
        options: GatewayOptions,
    ) -> Self {
        let connections = endpoints
            .into_iter()
            .map(|endpoint| {
                Arc::new(ProviderConnection::new(
                    endpoint,
                    options.provider_call_timeout,
                ))
            })
            .collect();

        Self {
            connections,
            llm,
            options,
            phase: Mutex::new(GatewayPhase::Uninitialized),
            orchestrator: RwLock::new(None),
        }
    }

    pub fn phase(&self) -> GatewayPhase {
        *self.phase.lock().unwrap()
    }

    fn set_phase(&self, next: GatewayPhase) {
        *self.phase.lock().unwrap() = next;
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == GatewayPhase::Ready
    }

    /// The agent, available only while the gateway is ready.
    pub fn orchestrator(&self) -> Option<Arc<AgentOrchestrator>> {
        if !self.is_ready() {
            return None;
        }
        self.orchestrator.read().unwrap().clone()
    }

    /// Connect every provider, aggregate their catalogs and build the agent.
    ///
    /// All providers must connect; a single failure aborts startup and the
    /// gateway never becomes ready.
    pub async fn start(&self) -> Result<(), StartupError> {
        {
            let mut phase = self.phase.lock().unwrap();
            if *phase != GatewayPhase::Uninitialized {
                return Err(StartupError::InvalidPhase(*phase));
            }
            *phase = GatewayPhase::Starting;
        }

        info!(
            provider_count = self.connections.len(),
            "Starting gateway: connecting to tool providers"
        );

        try_join_all(self.connections.iter().map(|conn| conn.connect())).await?;

        let mut tools: Vec<Arc<dyn AgentTool>> = Vec::new();
        for connection in &self.connections {
            let catalog = connection.list_tools().await?;
            info!(
                provider = %connection.endpoint(),
                tool_count = catalog.len(),
                "Provider catalog fetched"
            );
            for definition in catalog {
                tools.push(Arc::new(RemoteTool::new(definition, connection.clone())));
            }
        }

        let registry = Arc::new(ToolRegistry::aggregate(tools)?);
        let orchestrator = AgentOrchestrator::new(
            self.options.system_prompt.clone(),
            self.llm.clone(),
            registry,
        )?
        .with_max_iterations(self.options.max_iterations);

        info!(
            tool_count = orchestrator.tool_count(),
            engine = %self.llm.name(),
            "Agent initialized, gateway is ready"
        );

        *self.orchestrator.write().unwrap() = Some(Arc::new(orchestrator));
        self.set_phase(GatewayPhase::Ready);

        Ok(())
    }

    /// Drain and tear everything down in reverse startup order.
    ///
    /// Never fails: disconnect errors are logged inside the connections.
    pub async fn shutdown(&self) {
        {
            let mut phase = self.phase.lock().unwrap();
            if *phase == GatewayPhase::Stopped {
                return;
            }
            *phase = GatewayPhase::Draining;
        }

        info!("Gateway draining: disconnecting tool providers");

        for connection in &self.connections {
            connection.disconnect().await;
        }

        *self.orchestrator.write().unwrap() = None;
        self.set_phase(GatewayPhase::Stopped);

        info!("Gateway stopped");
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        let phase = self.phase();
        if phase == GatewayPhase::Ready || phase == GatewayPhase::Starting {
            error!(
                phase = %phase,
                "Gateway dropped without shutdown; provider sessions not released"
            );
        }
    }
}
