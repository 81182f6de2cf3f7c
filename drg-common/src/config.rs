//! Gateway configuration loading and resolution
//!
//! Config file resolution follows the priority order:
//! 1. Command-line argument (highest priority)
//! 2. `DRG_CONFIG` environment variable
//! 3. `drg.toml` in the working directory
//! 4. Compiled defaults (fallback)
//!
//! Every value has a compiled default so the gateway starts with zero
//! configuration.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "DRG_CONFIG";

/// Config file looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "drg.toml";

/// How the gateway reaches the research backend for a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Spawn a local research process per job (stdout/stderr relayed)
    Subprocess,
    /// Open a streaming HTTP connection to an upstream research service
    Upstream,
}

/// Backend channel configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub mode: BackendMode,
    /// Subprocess argv template; the question is appended as the final argument
    pub command: Vec<String>,
    /// Base URL of the upstream research service (upstream mode)
    pub upstream_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Subprocess,
            command: vec![
                "python3".to_string(),
                "-m".to_string(),
                "deep_crawler.cli".to_string(),
            ],
            upstream_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Report store proxy configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Base URL of the external report store
    pub store_url: String,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Top-level gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub listen_host: String,
    pub listen_port: u16,
    pub backend: BackendConfig,
    pub reports: ReportsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_host: "127.0.0.1".to_string(),
            listen_port: 3000,
            backend: BackendConfig::default(),
            reports: ReportsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration using the documented priority order
    ///
    /// A file named explicitly (CLI arg or env var) must exist and parse;
    /// the working-directory default is optional and falls back to compiled
    /// defaults when absent.
    pub fn resolve(cli_path: Option<&Path>) -> Result<Self> {
        // Priority 1: command-line argument
        if let Some(path) = cli_path {
            return Self::load(path);
        }

        // Priority 2: environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }

        // Priority 3: working-directory config file
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::load(&default_path);
        }

        // Priority 4: compiled defaults
        Ok(Self::default())
    }

    /// Listen address in `host:port` form
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }

    fn validate(&self) -> Result<()> {
        match self.backend.mode {
            BackendMode::Subprocess if self.backend.command.is_empty() => Err(Error::Config(
                "backend.command must not be empty in subprocess mode".to_string(),
            )),
            BackendMode::Upstream if self.backend.upstream_url.is_empty() => Err(Error::Config(
                "backend.upstream_url must not be empty in upstream mode".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_usable() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr(), "127.0.0.1:3000");
        assert_eq!(config.backend.mode, BackendMode::Subprocess);
        assert!(!config.backend.command.is_empty());
    }

    #[test]
    fn loads_full_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
listen_host = "0.0.0.0"
listen_port = 8080

[backend]
mode = "upstream"
upstream_url = "http://research.internal:9000"

[reports]
store_url = "http://reports.internal:9000"
"#
        )
        .unwrap();

        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.backend.mode, BackendMode::Upstream);
        assert_eq!(config.backend.upstream_url, "http://research.internal:9000");
        assert_eq!(config.reports.store_url, "http://reports.internal:9000");
        // Unspecified values keep their defaults
        assert!(!config.backend.command.is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "listen_port = 4000\n").unwrap();

        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.listen_port, 4000);
        assert_eq!(config.listen_host, "127.0.0.1");
        assert_eq!(config.backend.mode, BackendMode::Subprocess);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = GatewayConfig::resolve(Some(Path::new("/nonexistent/drg.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_empty_subprocess_command() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[backend]\nmode = \"subprocess\"\ncommand = []\n").unwrap();

        let err = GatewayConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_empty_upstream_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[backend]\nmode = \"upstream\"\nupstream_url = \"\"\n").unwrap();

        let err = GatewayConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
