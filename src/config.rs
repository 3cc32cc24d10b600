//! Runtime configuration for ollama-bridge.
//!
//! Configuration is loaded from a JSON file and then adjusted by command-line
//! overrides. Every section has defaults, so an absent file is not an error.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Family used when a request names no family or asks for `latest`.
pub const DEFAULT_FAMILY: &str = "gpt-4o";

/// Port the Ollama daemon listens on; clients expect it by default.
pub const DEFAULT_PORT: u16 = 11434;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid listen address {0}")]
    InvalidAddress(String),

    #[error("Upstream provider selected but no upstream_url configured")]
    MissingUpstreamUrl,
}

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ollama-bridge",
    about = "Ollama- and OpenAI-compatible HTTP bridge for a chat model backend"
)]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "bridge.json")]
    pub config: PathBuf,

    /// Override the listen port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the listen host.
    #[arg(long)]
    pub host: Option<String>,

    /// Forward generations to an OpenAI-compatible server at this base URL.
    #[arg(long)]
    pub upstream: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit log lines as JSON objects.
    #[arg(long)]
    pub json_logs: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings.
    pub server: ServerConfig,

    /// Model backend settings.
    pub backend: BackendConfig,

    /// Model list settings for `/api/tags`.
    pub catalog: CatalogConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Start listening as soon as the process is up.
    pub auto_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            auto_start: true,
        }
    }
}

impl ServerConfig {
    /// Resolve the socket address to bind.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

/// Which provider backs generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Offline provider that repeats the last prompt line.
    Echo,
    /// OpenAI-compatible server reached over HTTP.
    Upstream,
}

/// Model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Provider implementation.
    pub provider: ProviderKind,

    /// Base URL of the upstream server (e.g. "http://localhost:8080").
    pub upstream_url: Option<String>,

    /// Bearer token sent to the upstream server.
    pub api_key: Option<String>,

    /// Family used when a request does not name one.
    pub default_family: String,

    /// Families offered by the echo provider.
    pub echo_families: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Echo,
            upstream_url: None,
            api_key: None,
            default_family: DEFAULT_FAMILY.to_string(),
            echo_families: vec![DEFAULT_FAMILY.to_string()],
        }
    }
}

/// Model list settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Namespace prefix of advertised model names (`<namespace>:<family>`).
    pub namespace: String,

    /// Families advertised when the backend cannot be enumerated.
    pub fallback_families: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            namespace: "copilot".to_string(),
            fallback_families: vec![
                "gpt-4o".to_string(),
                "gpt-4".to_string(),
                "gpt-3.5-turbo".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when it is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Apply command-line overrides on top of the file configuration.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(url) = &cli.upstream {
            self.backend.provider = ProviderKind::Upstream;
            self.backend.upstream_url = Some(url.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 11434);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert!(cfg.server.auto_start);
        assert_eq!(cfg.backend.default_family, "gpt-4o");
        assert_eq!(cfg.catalog.fallback_families.len(), 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"server": {{"port": 12000}}}}"#).unwrap();

        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.server.port, 12000);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.catalog.namespace, "copilot");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(cfg.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "ollama-bridge",
            "--port",
            "9000",
            "--upstream",
            "http://localhost:8080",
        ]);
        let mut cfg = Config::default();
        cfg.apply_cli(&cli);
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.backend.provider, ProviderKind::Upstream);
        assert!(!cli.json_logs);
        assert_eq!(
            cfg.server.listen_addr().unwrap(),
            "127.0.0.1:9000".parse().unwrap()
        );
    }

    #[test]
    fn test_json_logs_flag() {
        let cli = Cli::parse_from(["ollama-bridge", "--json-logs", "-v"]);
        assert!(cli.json_logs);
        assert!(cli.verbose);
    }
}
