//! pcdoc Configuration
//!
//! Config file: ~/.config/pcdoc/config.toml or /etc/pcdoc/config.toml

use crate::inference::{InferenceSettings, Strategy, DEFAULT_SCORING_THRESHOLD};
use crate::knowledge::JsonKnowledgeSource;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "PCDOC_CONFIG";

/// Knowledge file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Static knowledge base (JSON)
    #[serde(default = "default_static_path")]
    pub static_path: PathBuf,

    /// Contribution log (JSON Lines)
    #[serde(default = "default_user_path")]
    pub user_path: PathBuf,
}

fn default_static_path() -> PathBuf {
    PathBuf::from("/usr/share/pcdoc/knowledge.json")
}

fn default_user_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/var/lib"))
        .join("pcdoc")
        .join("contributions.jsonl")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            static_path: default_static_path(),
            user_path: default_user_path(),
        }
    }
}

impl KnowledgeConfig {
    pub fn source(&self) -> JsonKnowledgeSource {
        JsonKnowledgeSource::new(self.static_path.clone(), Some(self.user_path.clone()))
    }
}

/// Inference behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Strategy used when a request does not name one
    #[serde(default)]
    pub default_strategy: Strategy,

    /// Minimum accumulated weight for a conclusive scoring result
    #[serde(default = "default_threshold")]
    pub scoring_threshold: f64,

    /// Only accept a rule that explains every observed symptom
    #[serde(default)]
    pub require_full_coverage: bool,
}

fn default_threshold() -> f64 {
    DEFAULT_SCORING_THRESHOLD
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            default_strategy: Strategy::Rules,
            scoring_threshold: DEFAULT_SCORING_THRESHOLD,
            require_full_coverage: false,
        }
    }
}

impl InferenceConfig {
    pub fn settings(&self) -> InferenceSettings {
        InferenceSettings {
            scoring_threshold: self.scoring_threshold,
            require_full_coverage: self.require_full_coverage,
        }
    }
}

/// HTTP service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:7866".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Main pcdoc configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PcdocConfig {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl PcdocConfig {
    /// Get default user config path: ~/.config/pcdoc/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pcdoc").join("config.toml"))
    }

    /// Get system config path: /etc/pcdoc/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/pcdoc/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (command line)
    /// 2. $PCDOC_CONFIG
    /// 3. User config (~/.config/pcdoc/config.toml)
    /// 4. System config (/etc/pcdoc/config.toml)
    /// 5. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Self::from_file(Path::new(&path));
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::from_file(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::from_file(&system_path);
        }

        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: PcdocConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.inference.scoring_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            bail!("Invalid scoring_threshold: {} (must be a finite number >= 0)", threshold);
        }
        if self.server.bind.trim().is_empty() {
            bail!("server.bind must not be empty");
        }
        Ok(())
    }
}
