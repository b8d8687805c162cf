//! owlctl configuration.
//!
//! Config file: ~/.config/owlmind/config.toml or /etc/owlmind/config.toml
//!
//! ```toml
//! [engine]
//! strategy = "all_matches"
//! default_key = "response"
//! seed = 7
//!
//! [output]
//! color = "never"
//! json = false
//!
//! [log]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use clap::ValueEnum;
use owlmind::Strategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Color display mode, from `[output] color` or `--color`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when stdout is a terminal
    #[default]
    Auto,
    #[value(alias = "on")]
    Always,
    #[value(alias = "off")]
    Never,
}

/// Rule engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub strategy: Strategy,

    /// Key that bare-value actions assign to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_key: Option<String>,

    /// Fixed RNG seed for reproducible weighted selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: ColorMode,

    /// Print JSON instead of text
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing filter when OWLMIND_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Main owlctl configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwlConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl OwlConfig {
    /// User config path: $XDG_CONFIG_HOME/owlmind/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("owlmind").join("config.toml"))
    }

    /// System config path: /etc/owlmind/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/owlmind/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config
    /// 3. System config
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from_path(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::load_from_path(&system_path);
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Command-line flags take precedence over the file.
    pub fn override_output(&mut self, color: Option<ColorMode>, json: bool) {
        if let Some(color) = color {
            self.output.color = color;
        }
        self.output.json |= json;
    }
}
