//! Repository configuration (`config.toml` plus environment overrides).

use crate::error::{ContextError, Result};
use crate::store::{Format, Store};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the context directory when `GITCONTEXT_DIR` is unset.
pub const DEFAULT_CONTEXT_DIR: &str = ".gitcontext";

/// Config file name inside the context directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the context directory name.
pub const ENV_CONTEXT_DIR: &str = "GITCONTEXT_DIR";
/// Environment variable overriding `[analysis].provider`.
pub const ENV_PROVIDER: &str = "GITCONTEXT_LLM_PROVIDER";
/// Environment variable overriding `[analysis].model`.
pub const ENV_MODEL: &str = "GITCONTEXT_LLM_MODEL";
/// Environment variable overriding `[source].auto_commit`.
pub const ENV_AUTO_COMMIT: &str = "GITCONTEXT_AUTO_COMMIT";

/// Full repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Analysis backend selection and request limits.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// On-disk formats.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Interaction with the underlying source repository.
    #[serde(default)]
    pub source: SourceConfig,
}

impl Config {
    /// Loads `config.toml` from `context_dir` and applies environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(context_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(context_dir)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads `config.toml` without looking at the environment.
    pub fn load_file(context_dir: &Path) -> Result<Self> {
        let path = context_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| ContextError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ContextError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Writes `config.toml` into `context_dir`. Credentials are never written.
    pub fn save(&self, context_dir: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ContextError::Config(format!("failed to serialize config: {}", e)))?;
        Store::new(context_dir).write_text(CONFIG_FILE, &content)?;
        Ok(())
    }

    /// Applies overrides from `lookup` (normally the process environment).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup(ENV_PROVIDER).filter(|v| !v.trim().is_empty()) {
            self.analysis.provider = provider.trim().to_lowercase();
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.analysis.model = Some(model.trim().to_string());
        }
        if let Some(flag) = lookup(ENV_AUTO_COMMIT) {
            self.source.auto_commit = parse_flag(&flag);
        }
        if let Some(var) = AnalysisConfig::api_key_var(&self.analysis.provider) {
            if let Some(key) = lookup(var).filter(|v| !v.is_empty()) {
                self.analysis.api_key = Some(key);
            }
        }
    }
}

/// Returns the context directory name, honouring `GITCONTEXT_DIR`.
pub fn context_dir_name() -> String {
    std::env::var(ENV_CONTEXT_DIR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONTEXT_DIR.to_string())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Analysis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Provider name: `stub`, `openai`, `anthropic`, `deepseek` or `ollama`.
    pub provider: String,

    /// Model override; each provider has its own default.
    pub model: Option<String>,

    /// Endpoint override (e.g. a self-hosted Ollama).
    pub base_url: Option<String>,

    /// Sampling temperature (default: 0.3).
    pub temperature: f64,

    /// Response token cap (default: 2000).
    pub max_tokens: u32,

    /// Request timeout in seconds (default: 60).
    pub timeout_secs: u64,

    /// Number of most recent reasoning logs sent for analysis (default: 15).
    pub log_window: usize,

    /// Credential taken from the environment only.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            provider: "stub".to_string(),
            model: None,
            base_url: None,
            temperature: 0.3,
            max_tokens: 2000,
            timeout_secs: 60,
            log_window: 15,
            api_key: None,
        }
    }
}

impl AnalysisConfig {
    /// Environment variable holding the credential for `provider`, if it needs one.
    pub fn api_key_var(provider: &str) -> Option<&'static str> {
        match provider {
            "openai" => Some("OPENAI_API_KEY"),
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            "deepseek" => Some("DEEPSEEK_API_KEY"),
            _ => None,
        }
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Index document encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexFormat {
    /// `index.yaml`
    #[default]
    Yaml,
    /// `index.json`
    Json,
}

impl From<IndexFormat> for Format {
    fn from(f: IndexFormat) -> Self {
        match f {
            IndexFormat::Yaml => Format::Yaml,
            IndexFormat::Json => Format::Json,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Encoding of the index document (default: yaml).
    pub index_format: IndexFormat,

    /// Write `branch.json.zst` instead of `branch.json` into archives (default: false).
    pub compress_archive: bool,
}

impl StorageConfig {
    /// Format of the structured archive document.
    pub fn archive_format(&self) -> Format {
        if self.compress_archive {
            Format::CompressedJson
        } else {
            Format::Json
        }
    }
}

/// Source repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Mirror each context commit into the source repository (default: false).
    pub auto_commit: bool,
}
