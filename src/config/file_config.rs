use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub host: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub system_prompt: Option<String>,
    pub provider_timeout_sec: Option<u64>,
    pub max_iterations: Option<usize>,

    // Tool providers, in connection order
    #[serde(rename = "provider")]
    pub providers: Vec<ProviderConfig>,

    // Reasoning engine
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: Option<String>,
    /// Model name to request.
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: FileConfig = toml::from_str(
            r#"
            port = 9000
            logging_level = "headers"

            [[provider]]
            id = "calc"
            url = "http://localhost:8081"

            [[provider]]
            id = "facts"
            url = "http://localhost:8082"

            [llm]
            base_url = "http://localhost:11434/v1"
            model = "qwen2.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.port, Some(9000));
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].id, "calc");
        assert_eq!(
            config.llm.unwrap().base_url.as_deref(),
            Some("http://localhost:11434/v1")
        );
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.providers.is_empty());
        assert!(config.port.is_none());
        assert!(config.llm.is_none());
    }
}
