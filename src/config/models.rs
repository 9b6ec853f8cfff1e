use crate::connections::ConnectionDescriptor;
use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub connections: ConnectionsConfig,
}

/// Admin HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Refresh cadence and pool sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Seconds between unconditional refresh cycles
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,
    /// Cap on concurrent fetches per cycle
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Connection-name prefix marking a connection as cached
    #[serde(default = "default_connection_prefix")]
    pub connection_prefix: String,
    /// Run a cycle immediately at startup instead of after the first interval
    #[serde(default = "default_warm_on_start")]
    pub warm_on_start: bool,
}

impl SchedulerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval_seconds(),
            max_workers: default_max_workers(),
            connection_prefix: default_connection_prefix(),
            warm_on_start: default_warm_on_start(),
        }
    }
}

fn default_refresh_interval_seconds() -> u64 {
    36000 // 10 hours
}

fn default_max_workers() -> usize {
    10
}

fn default_connection_prefix() -> String {
    "mini:".to_string()
}

fn default_warm_on_start() -> bool {
    false
}

/// Cache backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Fjall,
    Memory,
    Local,
}

/// Cache store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    /// Keyspace directory (fjall) or root directory (local)
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/cache")
}

/// Control-plane REST endpoint used for fetching and enumeration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Unset means no deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<HumanDuration>,
    /// Unset means no deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<HumanDuration>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:1024/spider".to_string()
}

fn default_user_agent() -> String {
    format!("warmcache/{}", env!("CARGO_PKG_VERSION"))
}

/// Where the list of connections comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionSource {
    #[default]
    Upstream,
    Static,
}

/// Connection enumeration configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConnectionsConfig {
    #[serde(default)]
    pub source: ConnectionSource,
    /// Used when `source = "static"`
    #[serde(default)]
    pub entries: Vec<ConnectionDescriptor>,
}
