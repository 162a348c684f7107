//! Configuration for glosa

use crate::error::GlosaError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# Glosa Configuration

[service]
# Base URL of the correction service (analysis + patch endpoints)
base_url = "http://localhost:8000/api/correccion"
# Request timeout (e.g., "30s", "2m")
timeout = "30s"

[explorer]
# Cap on matches printed by the search command
max_results = 200
# Values longer than this are truncated in tree output
value_preview_chars = 80
"#;

/// Glosa configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_value_preview_chars")]
    pub value_preview_chars: usize,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/correccion".to_string()
}
fn default_timeout() -> String {
    "30s".to_string()
}
fn default_max_results() -> usize {
    200
}
fn default_value_preview_chars() -> usize {
    80
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            value_preview_chars: default_value_preview_chars(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| GlosaError::ConfigParse(e.to_string()))
    }

    /// Request timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        parse_duration(&self.service.timeout).unwrap_or(Duration::from_secs(30))
    }
}

/// Parse duration string (e.g., "30s", "2m", "1h")
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: u64 = num_str.parse().ok()?;

    match unit {
        "s" => Some(Duration::from_secs(num)),
        "m" => Some(Duration::from_secs(num * 60)),
        "h" => Some(Duration::from_secs(num * 3600)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.service.timeout, "30s");
        assert_eq!(config.explorer.max_results, 200);
        assert!(config.service.base_url.ends_with("/api/correccion"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.explorer.value_preview_chars, 80);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("soon"), None);
    }

    #[test]
    fn test_timeout_duration_falls_back() {
        let config = Config::from_toml("[service]\ntimeout = \"bogus\"").unwrap();
        assert_eq!(config.timeout_duration(), Duration::from_secs(30));
    }
}
