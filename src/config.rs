//! Service configuration: defaults, optional JSON / YAML file, CLI overrides.

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment fallback for `--config`.
pub const CONFIG_ENV: &str = "NAP_CONFIG";

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Raw TCP, one framed envelope per connection
    #[default]
    Stream,
    /// HTTP GET with query-string flags
    Http,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Stream => "stream",
            TransportKind::Http => "http",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub transport: TransportKind,
    pub autoformat: bool,
    /// Pause between computing and sending a stream response.
    pub response_delay_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            host: "127.0.0.1".to_string(),
            port: 7000,
            transport: TransportKind::Stream,
            autoformat: true,
            response_delay_ms: 0,
        }
    }
}

impl ServeConfig {
    /// Load from `.yaml` / `.yml` (YAML) or anything else (JSON). Missing keys keep defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let lower = path.to_string_lossy().to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&raw).context("failed to parse YAML config file")
        } else {
            serde_json::from_str(&raw).context("failed to parse JSON config file")
        }
    }

    /// Explicit path first, then `NAP_CONFIG`, then defaults.
    pub fn resolve(path: Option<&str>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty());
        match path.map(str::to_string).or(from_env) {
            Some(p) => Self::load(p.trim()),
            None => Ok(Self::default()),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))?
            .next()
            .with_context(|| format!("no address resolved for {}", self.host))
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }
}
