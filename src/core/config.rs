//! Server Configuration
//!
//! All settings come from environment variables, each with a default:
//! - SERVER_NAME: Name of the server (default: "server")
//! - SERVER_VERSION: Version string (default: the crate version)
//! - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "http")
//! - HOST: Bind address for HTTP mode (default: "0.0.0.0")
//! - PORT: Port number for HTTP mode (default: 8000)
//! - WORKER_THREADS: HTTP worker count (default: CPU count, capped at 16)
//! - RNG_SEED: Seed for the random source (default: OS entropy)

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid transport mode '{0}', must be 'stdio', 'http', or 'both'")]
    TransportMode(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which transports the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Line-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over HTTP POST
    Http,
    /// STDIO in a background task, HTTP in the foreground
    Both,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(TransportMode::Stdio),
            "http" => Ok(TransportMode::Http),
            "both" => Ok(TransportMode::Both),
            _ => Err(ConfigError::TransportMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub rng_seed: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let transport = match lookup("MCP_TRANSPORT_MODE") {
            Some(mode) => mode.parse()?,
            None => TransportMode::Http,
        };

        Ok(Self {
            name: var("SERVER_NAME", "server"),
            version: var("SERVER_VERSION", env!("CARGO_PKG_VERSION")),
            transport,
            host: var("HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PORT")?.unwrap_or(8000),
            workers: parse_var(&lookup, "WORKER_THREADS")?
                .filter(|&n| n > 0)
                .unwrap_or_else(|| num_cpus::get().clamp(1, 16)),
            rng_seed: parse_var(&lookup, "RNG_SEED")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
}
