//! Layered CLI configuration.
//!
//! Values are resolved field by field with the following precedence,
//! lowest to highest:
//!
//! 1. Built-in defaults.
//! 2. `~/.reglens/config.toml`, when present.
//! 3. `REGLENS_*` environment variables.
//! 4. Command-line flags.

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use reglens_core::protocol::model::Severity;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Contents of `~/.reglens/config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub min_severity: Option<String>,
}

/// A single override layer. `None` fields leave the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub min_severity: Option<Severity>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    /// Seconds before an in-flight analysis is cancelled. Zero disables
    /// the timeout.
    pub timeout_secs: u64,
    /// Hide rendered considerations and highlights below this severity.
    pub min_severity: Option<Severity>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 0,
            min_severity: None,
        }
    }
}

impl Config {
    pub fn load(flags: Overrides) -> Result<Self> {
        let file = read_config_file()?;
        Ok(Self::resolve(file, env_overrides(), flags))
    }

    fn resolve(file: FileConfig, env: Overrides, flags: Overrides) -> Self {
        let mut config = Self::default();
        let file = Overrides {
            base_url: file.base_url,
            timeout_secs: file.timeout_secs,
            min_severity: file.min_severity.as_deref().and_then(parse_severity),
        };
        for layer in [file, env, flags] {
            if let Some(base_url) = layer.base_url {
                config.base_url = base_url;
            }
            if let Some(timeout_secs) = layer.timeout_secs {
                config.timeout_secs = timeout_secs;
            }
            if let Some(min_severity) = layer.min_severity {
                config.min_severity = Some(min_severity);
            }
        }
        config
    }
}

fn parse_severity(raw: &str) -> Option<Severity> {
    let parsed = Severity::parse(raw);
    if parsed.is_none() {
        tracing::warn!(value = %raw, "ignoring unknown severity; expected low, medium or high");
    }
    parsed
}

fn read_config_file() -> Result<FileConfig> {
    let Some(path) = config_path() else {
        return Ok(FileConfig::default());
    };
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".reglens").join("config.toml"))
}

fn env_overrides() -> Overrides {
    let timeout_secs = match env::var("REGLENS_TIMEOUT_SECS") {
        Ok(raw) => match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(value = %raw, "ignoring non-numeric REGLENS_TIMEOUT_SECS");
                None
            }
        },
        Err(_) => None,
    };
    Overrides {
        base_url: env::var("REGLENS_BASE_URL").ok(),
        timeout_secs,
        min_severity: env::var("REGLENS_MIN_SEVERITY")
            .ok()
            .as_deref()
            .and_then(parse_severity),
    }
}
