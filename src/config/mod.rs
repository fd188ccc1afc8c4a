mod file_config;

pub use file_config::{FileConfig, LlmConfig, ProviderConfig};

use crate::mcp::connection::ProviderEndpoint;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::time::Duration;

/// Environment fallback for the provider list (comma-separated `id=url`).
pub const PROVIDERS_ENV: &str = "GATEWAY_PROVIDERS";

/// Default environment variable holding the engine API key.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub providers: Vec<ProviderEndpoint>,
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub system_prompt: Option<String>,
    pub provider_timeout_sec: u64,
    pub max_iterations: usize,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key_env: Option<String>,
}

/// Fully resolved gateway configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub providers: Vec<ProviderEndpoint>,
    pub host: String,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub system_prompt: Option<String>,
    pub provider_timeout: Duration,
    pub max_iterations: usize,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    ///
    /// Provider endpoints come from the first non-empty source of: the TOML
    /// `[[provider]]` tables, the repeated `--provider` flags, the
    /// `GATEWAY_PROVIDERS` environment variable.
    pub fn resolve(cli: CliConfig, file: Option<FileConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();

        let logging_level = match file.logging_level {
            Some(value) => RequestsLoggingLevel::from_str(&value, true)
                .map_err(|e| anyhow::anyhow!("Invalid logging_level in config file: {}", e))?,
            None => cli.logging_level,
        };

        let providers = if !file.providers.is_empty() {
            file.providers
                .iter()
                .map(|p| make_endpoint(&p.id, &p.url))
                .collect::<Result<Vec<_>>>()?
        } else if !cli.providers.is_empty() {
            cli.providers
        } else {
            providers_from_env()?
        };

        let llm = file.llm.unwrap_or_default();
        let api_key_env = llm
            .api_key_env
            .or(cli.llm_api_key_env)
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());

        Ok(AppConfig {
            providers,
            host: file.host.unwrap_or(cli.host),
            port: file.port.unwrap_or(cli.port),
            metrics_port: file.metrics_port.unwrap_or(cli.metrics_port),
            logging_level,
            system_prompt: file.system_prompt.or(cli.system_prompt),
            provider_timeout: Duration::from_secs(
                file.provider_timeout_sec.unwrap_or(cli.provider_timeout_sec),
            ),
            max_iterations: file.max_iterations.unwrap_or(cli.max_iterations),
            llm_base_url: llm.base_url.unwrap_or(cli.llm_base_url),
            llm_model: llm.model.unwrap_or(cli.llm_model),
            llm_api_key: std::env::var(&api_key_env).ok(),
        })
    }
}

/// Parse one `id=url` provider spec (clap value parser).
pub fn parse_provider_endpoint(spec: &str) -> Result<ProviderEndpoint> {
    let Some((id, url)) = spec.split_once('=') else {
        bail!("Provider spec must look like id=http://host:port, got: {}", spec);
    };
    make_endpoint(id, url)
}

fn make_endpoint(id: &str, url: &str) -> Result<ProviderEndpoint> {
    let id = id.trim();
    let url = url.trim();

    if id.is_empty() {
        bail!("Provider id must not be empty");
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        bail!("Provider url must start with http:// or https://, got: {}", url);
    }

    Ok(ProviderEndpoint {
        id: id.to_string(),
        base_url: url.trim_end_matches('/').to_string(),
    })
}

fn providers_from_env() -> Result<Vec<ProviderEndpoint>> {
    let Ok(raw) = std::env::var(PROVIDERS_ENV) else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|spec| !spec.is_empty())
        .map(parse_provider_endpoint)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Invalid {} value", PROVIDERS_ENV))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_endpoint() {
        let endpoint = parse_provider_endpoint("calc=http://localhost:8081/").unwrap();
        assert_eq!(endpoint.id, "calc");
        assert_eq!(endpoint.base_url, "http://localhost:8081");
    }

    #[test]
    fn test_parse_provider_endpoint_rejects_bad_specs() {
        assert!(parse_provider_endpoint("no-equals-sign").is_err());
        assert!(parse_provider_endpoint("=http://localhost:8081").is_err());
        assert!(parse_provider_endpoint("calc=localhost:8081").is_err());
    }

    #[test]
    fn test_file_overrides_cli() {
        let cli = CliConfig {
            providers: vec![parse_provider_endpoint("a=http://localhost:1111").unwrap()],
            host: "127.0.0.1".to_string(),
            port: 8000,
            metrics_port: 9091,
            provider_timeout_sec: 30,
            max_iterations: 10,
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            ..CliConfig::default()
        };

        let file: FileConfig = toml::from_str(
            r#"
            port = 9000

            [[provider]]
            id = "b"
            url = "http://localhost:2222"

            [llm]
            model = "gpt-4o"
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(cli, Some(file)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].id, "b");
        assert_eq!(config.llm_model, "gpt-4o");
        // CLI value survives where the file is silent.
        assert_eq!(config.llm_base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_cli_providers_used_without_file() {
        let cli = CliConfig {
            providers: vec![parse_provider_endpoint("a=http://localhost:1111").unwrap()],
            host: "127.0.0.1".to_string(),
            port: 8000,
            metrics_port: 9091,
            provider_timeout_sec: 30,
            max_iterations: 10,
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            ..CliConfig::default()
        };

        let config = AppConfig::resolve(cli, None).unwrap();
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].id, "a");
    }
}
