//! Standalone demo tool provider.
//!
//! Serves the bundled arithmetic MCP provider so the gateway has something
//! to connect to without any external deployment:
//!
//! ```sh
//! demo-provider --port 8081
//! agent-gateway --provider calc=http://127.0.0.1:8081
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Address to bind on.
    #[clap(long, default_value = "127.0.0.1")]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8081)]
    pub port: u16,
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

    let app = agent_gateway::demo::router();
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", cli_args.host, cli_args.port)).await?;
    info!(host = %cli_args.host, port = cli_args.port, "Demo tool provider listening");

    Ok(axum::serve(listener, app).await?)
}
