//! Configuration loading and resolution
//!
//! Settings resolve with priority: environment variable → TOML config file →
//! compiled default. The config file location itself follows the same order
//! (`SONGDEX_CONFIG` → platform config dir → none).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP bind port for the catalog enrichment service
pub const DEFAULT_PORT: u16 = 5742;

/// Default tracing filter when neither RUST_LOG nor the config file set one
pub const DEFAULT_LOG_FILTER: &str = "info";

/// TOML configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// HTTP bind port
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

/// Logging section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// tracing-subscriber env-filter directive, e.g. "info,songdex_ce=debug"
    pub filter: Option<String>,
}

/// Enrichment provider section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Provider API base URL
    pub base_url: String,

    /// User-Agent sent with provider requests (required by MusicBrainz)
    pub user_agent: String,

    /// Minimum interval between provider requests (milliseconds)
    pub rate_limit_ms: u64,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            user_agent: "Songdex/0.1.0 (https://github.com/songdex/songdex)".to_string(),
            rate_limit_ms: 1000,
            timeout_secs: 30,
        }
    }
}

/// Load configuration, resolving the file path in priority order:
/// 1. Explicit path argument (highest)
/// 2. `SONGDEX_CONFIG` environment variable
/// 3. Platform config dir (`~/.config/songdex/songdex-ce.toml`)
/// 4. Compiled defaults (no file)
pub fn load_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit_path {
        return read_config_file(path);
    }

    if let Ok(path) = std::env::var("SONGDEX_CONFIG") {
        return read_config_file(Path::new(&path));
    }

    if let Some(path) = default_config_path() {
        if path.exists() {
            return read_config_file(&path);
        }
    }

    info!("No config file found, using compiled defaults");
    Ok(TomlConfig::default())
}

/// Resolve the HTTP bind port: `SONGDEX_PORT` env → config file → default
pub fn resolve_port(config: &TomlConfig) -> u16 {
    if let Ok(raw) = std::env::var("SONGDEX_PORT") {
        match raw.parse::<u16>() {
            Ok(port) => return port,
            Err(_) => warn!("Ignoring invalid SONGDEX_PORT value: {raw}"),
        }
    }

    config.port.unwrap_or(DEFAULT_PORT)
}

/// Resolve the tracing filter: `RUST_LOG` env → config file → default
pub fn resolve_log_filter(config: &TomlConfig) -> String {
    if let Ok(filter) = std::env::var("RUST_LOG") {
        if !filter.trim().is_empty() {
            return filter;
        }
    }

    config
        .logging
        .filter
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn read_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config failed ({}): {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config failed ({}): {}", path.display(), e)))?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Platform config file location
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songdex").join("songdex-ce.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        std::env::remove_var("SONGDEX_CONFIG");
        std::env::remove_var("SONGDEX_PORT");
    }

    #[test]
    #[serial]
    fn missing_file_falls_back_to_defaults() {
        clear_env();
        let config = load_config(None).expect("defaults load");
        assert_eq!(resolve_port(&config), DEFAULT_PORT);
        assert_eq!(
            config.enrichment.base_url,
            "https://musicbrainz.org/ws/2".to_string()
        );
    }

    #[test]
    #[serial]
    fn explicit_path_wins() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "port = 6001\n\n[enrichment]\nbase_url = \"http://localhost:9999\"\nuser_agent = \"test\"\nrate_limit_ms = 10\ntimeout_secs = 2\n"
        )
        .expect("write config");

        let config = load_config(Some(file.path())).expect("config parses");
        assert_eq!(config.port, Some(6001));
        assert_eq!(resolve_port(&config), 6001);
        assert_eq!(config.enrichment.base_url, "http://localhost:9999");
        assert_eq!(config.enrichment.rate_limit_ms, 10);
    }

    #[test]
    #[serial]
    fn env_port_overrides_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "port = 6001").expect("write config");
        std::env::set_var("SONGDEX_PORT", "7001");

        let config = load_config(Some(file.path())).expect("config parses");
        assert_eq!(resolve_port(&config), 7001);

        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_env_port_is_ignored() {
        clear_env();
        std::env::set_var("SONGDEX_PORT", "not-a-port");
        let config = TomlConfig::default();
        assert_eq!(resolve_port(&config), DEFAULT_PORT);
        clear_env();
    }

    #[test]
    #[serial]
    fn malformed_file_is_a_config_error() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "port = \"definitely not a number").expect("write config");

        match load_config(Some(file.path())) {
            Err(Error::Config(msg)) => assert!(msg.contains("Parse config failed")),
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }
}
