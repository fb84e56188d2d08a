//! Configuration for pokecoach.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (OPENROUTER_API_KEY, OPENROUTER_BASE_URL, POKECOACH_MODEL)
//! 2. Config file (.pokecoach/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .pokecoach/config.yaml
//! - Falls back to the user config directory (e.g. ~/.config/pokecoach/config.yaml)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::RetryPolicy;
use crate::core::guardrails::GuardrailLimits;
use crate::parser::{clamp_lookback, DEFAULT_KO_LOOKBACK};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<CoachConfig, String>> = OnceLock::new();

pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT_SECONDS: u64 = 30;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    pub ko_lookback_window: Option<usize>,
    pub min_confidence: Option<f64>,
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_policy: Option<RetryPolicy>,
}

/// Resolved language-model settings
#[derive(Debug, Clone, Serialize)]
pub struct LlmSettings {
    /// Never serialized, so `pokecoach config` cannot leak it
    #[serde(skip)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub retry_policy: RetryPolicy,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENROUTER_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: DEFAULT_LLM_TIMEOUT_SECONDS,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl LlmSettings {
    /// Live mode needs a non-empty key and model
    pub fn live_mode_enabled(&self) -> bool {
        let has_key = self
            .api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false);
        has_key && !self.model.trim().is_empty()
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct CoachConfig {
    /// Lines scanned backward from a KO line, clamped to [8, 15]
    pub ko_lookback_window: usize,
    pub guardrails: GuardrailLimits,
    pub llm: LlmSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            ko_lookback_window: DEFAULT_KO_LOOKBACK,
            guardrails: GuardrailLimits::default(),
            llm: LlmSettings::default(),
            config_file: None,
        }
    }
}

impl CoachConfig {
    /// Resolve settings from an optional file and an environment lookup
    pub fn resolve<F>(file: Option<ConfigFile>, config_file: Option<PathBuf>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file.unwrap_or_default();
        let llm_file = file.llm.unwrap_or_default();

        let mut guardrails = GuardrailLimits::default();
        if let Some(min_confidence) = file.min_confidence {
            guardrails.min_confidence = min_confidence;
        }

        let llm = LlmSettings {
            api_key: env("OPENROUTER_API_KEY"),
            base_url: env("OPENROUTER_BASE_URL")
                .or(llm_file.base_url)
                .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string()),
            model: env("POKECOACH_MODEL")
                .or(llm_file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout_seconds: llm_file
                .timeout_seconds
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECONDS),
            retry_policy: llm_file.retry_policy.unwrap_or_default(),
        };

        Self {
            ko_lookback_window: clamp_lookback(
                file.ko_lookback_window.unwrap_or(DEFAULT_KO_LOOKBACK),
            ),
            guardrails,
            llm,
            config_file,
        }
    }

    /// Same settings with live guidance switched off
    pub fn deterministic(mut self) -> Self {
        self.llm.api_key = None;
        self
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".pokecoach").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let user_config = dirs::config_dir()?.join("pokecoach").join("config.yaml");
    user_config.exists().then_some(user_config)
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from all sources
fn load_config() -> Result<CoachConfig> {
    let config_file = find_config_file();
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };
    Ok(CoachConfig::resolve(file, config_file, |key| {
        std::env::var(key).ok()
    }))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static CoachConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<CoachConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = CoachConfig::resolve(None, None, no_env);
        assert_eq!(config.ko_lookback_window, 12);
        assert_eq!(config.llm.base_url, DEFAULT_OPENROUTER_BASE_URL);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert!(!config.llm.live_mode_enabled());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing_and_clamp() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".pokecoach");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1"
ko_lookback_window: 40
min_confidence: 0.6
llm:
  model: anthropic/some-model
  timeout_seconds: 5
  retry_policy:
    max_attempts: 4
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        let config = CoachConfig::resolve(Some(parsed), Some(config_path), no_env);
        assert_eq!(config.ko_lookback_window, 15);
        assert_eq!(config.guardrails.min_confidence, 0.6);
        assert_eq!(config.llm.model, "anthropic/some-model");
        assert_eq!(config.llm.timeout_seconds, 5);
        assert_eq!(config.llm.retry_policy.max_attempts, 4);
        assert_eq!(config.llm.retry_policy.initial_delay_ms, 500);
    }

    #[test]
    fn test_env_overrides_and_live_mode() {
        let env: HashMap<&str, &str> = [
            ("OPENROUTER_API_KEY", "sk-test"),
            ("OPENROUTER_BASE_URL", "http://localhost:9"),
            ("POKECOACH_MODEL", "m"),
        ]
        .into_iter()
        .collect();
        let file = ConfigFile {
            llm: Some(LlmConfig {
                model: Some("file-model".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = CoachConfig::resolve(Some(file), None, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.llm.base_url, "http://localhost:9");
        assert_eq!(config.llm.model, "m");
        assert!(config.llm.live_mode_enabled());
        assert!(!config.deterministic().llm.live_mode_enabled());
    }

    #[test]
    fn test_blank_key_is_not_live() {
        let config = CoachConfig::resolve(None, None, |k| {
            (k == "OPENROUTER_API_KEY").then(|| "  ".to_string())
        });
        assert!(!config.llm.live_mode_enabled());
    }
}
