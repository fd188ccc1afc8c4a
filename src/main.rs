use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agent_gateway::agent::OpenAiEngine;
use agent_gateway::config::{
    parse_provider_endpoint, AppConfig, CliConfig, FileConfig, PROVIDERS_ENV,
};
use agent_gateway::gateway::{Gateway, GatewayOptions};
use agent_gateway::mcp::ProviderEndpoint;
use agent_gateway::server::state::ServerState;
use agent_gateway::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Tool provider endpoint as id=http://host:port (repeatable).
    #[clap(long = "provider", value_parser = parse_provider_endpoint)]
    pub providers: Vec<ProviderEndpoint>,

    /// Path to a TOML config file (its values override CLI flags).
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Address to bind the gateway API on.
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Override the agent's system prompt.
    #[clap(long)]
    pub system_prompt: Option<String>,

    /// Timeout in seconds for tool provider requests.
    #[clap(long, default_value_t = 30)]
    pub provider_timeout_sec: u64,

    /// Maximum reasoning iterations per chat request.
    #[clap(long, default_value_t = 10)]
    pub max_iterations: usize,

    /// Base URL of the OpenAI-compatible reasoning engine.
    #[clap(long, default_value = "https://api.openai.com/v1")]
    pub llm_base_url: String,

    /// Model to request from the reasoning engine.
    #[clap(long, default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// Environment variable holding the engine API key.
    #[clap(long)]
    pub llm_api_key_env: Option<String>,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            providers: args.providers.clone(),
            host: args.host.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            system_prompt: args.system_prompt.clone(),
            provider_timeout_sec: args.provider_timeout_sec,
            max_iterations: args.max_iterations,
            llm_base_url: args.llm_base_url.clone(),
            llm_model: args.llm_model.clone(),
            llm_api_key_env: args.llm_api_key_env.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(CliConfig::from(&cli_args), file_config)?;

    if config.providers.is_empty() {
        bail!(
            "No tool providers configured. Pass --provider id=http://host:port, list \
             [[provider]] tables in the config file, or set {}.",
            PROVIDERS_ENV
        );
    }

    metrics::register_metrics();
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = metrics::run_metrics_server(metrics_port).await {
            error!("Metrics server failed: {}", e);
        }
    });

    let engine = Arc::new(OpenAiEngine::new(
        config.llm_base_url.clone(),
        config.llm_model.clone(),
        config.llm_api_key.clone(),
    ));

    let mut options = GatewayOptions {
        provider_call_timeout: config.provider_timeout,
        max_iterations: config.max_iterations,
        ..GatewayOptions::default()
    };
    if let Some(system_prompt) = &config.system_prompt {
        options.system_prompt = system_prompt.clone();
    }

    let gateway = Arc::new(Gateway::new(config.providers.clone(), engine, options));

    info!(
        provider_count = config.providers.len(),
        model = %config.llm_model,
        "Starting agent gateway"
    );

    // All providers must be up before we accept traffic.
    if let Err(err) = gateway.start().await {
        gateway.shutdown().await;
        return Err(err).context("Gateway startup failed");
    }

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        host: config.host.clone(),
        port: config.port,
    };
    let state = ServerState::new(server_config.clone(), gateway.clone());

    let result = run_server(server_config, state, shutdown_signal()).await;

    gateway.shutdown().await;

    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received, draining");
}
