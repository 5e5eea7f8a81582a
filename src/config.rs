//! Configuration management for parley.
//!
//! Settings come from `~/.parley/config.toml`, with environment variables
//! taking precedence. The API key is never baked into the binary: it is
//! either set in the config file or read from the environment variable
//! named by `api_key_env`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// First message shown in every new conversation.
    pub welcome: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome: "Welcome to parley. Type a message to begin.".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                model: "gpt-4o-mini".to_string(),
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                api_key: None,
                api_key_env: default_api_key_env(),
                max_tokens: 1000,
                timeout_secs: default_timeout_secs(),
            },
            chat: ChatConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".parley").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("PARLEY_MODEL") {
            self.llm.model = model;
        }
        if let Ok(endpoint) = std::env::var("PARLEY_ENDPOINT") {
            self.llm.endpoint = endpoint;
        }
        self
    }

    /// Resolve the API key: config file value first, then the environment
    /// variable named by `api_key_env`. Returns an empty string when neither
    /// is set; the client treats a blank key as "not configured" rather than
    /// an error.
    pub fn api_key(&self) -> String {
        if let Some(key) = &self.llm.api_key {
            if !key.is_empty() {
                return key.clone();
            }
        }
        std::env::var(&self.llm.api_key_env).unwrap_or_default()
    }

    pub fn save_default() -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let default = Self::default();
        let content = toml::to_string_pretty(&default).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 1000);
        assert_eq!(config.llm.timeout_secs, 60);
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
[llm]
model = "test-model"
endpoint = "https://example.invalid/v1/chat/completions"
api_key = "secret"
max_tokens = 256
"#
        )
        .unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.llm.model, "test-model");
        assert_eq!(config.llm.max_tokens, 256);
        assert_eq!(config.api_key(), "secret");
        // defaults fill the omitted fields
        assert_eq!(config.llm.api_key_env, "LLM_API_KEY");
        assert_eq!(config.llm.timeout_secs, 60);
    }

    #[test]
    fn test_api_key_blank_when_unset() {
        let mut config = AppConfig::default();
        config.llm.api_key_env = "PARLEY_TEST_KEY_THAT_IS_NOT_SET".to_string();
        assert_eq!(config.api_key(), "");
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = AppConfig::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.llm.endpoint, config.llm.endpoint);
        assert_eq!(parsed.chat.welcome, config.chat.welcome);
    }
}
