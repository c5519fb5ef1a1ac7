//! # Node Configuration
//!
//! Unified configuration for every subsystem of a node.
//!
//! ## Loading Order
//!
//! 1. Built-in defaults (every section implements `Default`)
//! 2. Optional TOML file named by `PL_CONFIG`
//! 3. Environment overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PL_HTTP_PORT` | `api.port` |
//! | `PL_GOSSIP_PORT` | `network.gossip_port` |
//! | `PL_DATA_DIR` | `storage.data_dir` |
//! | `PL_PEERS` | `network.peers` (comma separated) |
//! | `PL_ADVERTISE_ADDRESS` | `network.advertise_address` |
//!
//! The result is validated before anything is started.

use pl_03_consensus::ConsensusConfig;
use pl_04_gossip::GossipConfig;
use pl_05_health_supervisor::SupervisorConfig;
use pl_06_api_gateway::ApiConfig;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Gossip listener and peers.
    pub network: NetworkConfig,
    /// On-disk locations.
    pub storage: StorageConfig,
    pub consensus: ConsensusConfig,
    pub gossip: GossipConfig,
    /// Health supervisor.
    pub health: SupervisorConfig,
    /// HTTP gateway.
    pub api: ApiConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("health.desync_polls_before_restart must be at least 2, got {0}")]
    SinglePollRestart(u32),

    #[error("chain state path {path} is outside the data directory {data_dir}")]
    ChainPathOutsideDataDir { path: PathBuf, data_dir: PathBuf },
}

/// Gossip listener and peer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Interface the gossip listener binds.
    pub gossip_bind_address: String,
    pub gossip_port: u16,
    /// Address peers should dial to reach this node. Defaults to
    /// `127.0.0.1:<gossip_port>`.
    pub advertise_address: Option<String>,
    /// Bootstrap peers, `host:port`.
    pub peers: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            gossip_bind_address: "0.0.0.0".to_string(),
            gossip_port: 7070,
            advertise_address: None,
            peers: Vec::new(),
        }
    }
}

impl NetworkConfig {
    pub fn gossip_bind(&self) -> String {
        format!("{}:{}", self.gossip_bind_address, self.gossip_port)
    }

    pub fn advertised(&self) -> String {
        self.advertise_address
            .clone()
            .unwrap_or_else(|| format!("127.0.0.1:{}", self.gossip_port))
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of everything the node writes.
    pub data_dir: PathBuf,
    /// Ingest log file, relative to `data_dir` unless absolute.
    pub ingest_file: PathBuf,
    /// Persisted chain state, relative to `data_dir` unless absolute.
    pub chain_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            ingest_file: PathBuf::from("ingest.log"),
            chain_file: PathBuf::from("chain.json"),
        }
    }
}

impl StorageConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn ingest_path(&self) -> PathBuf {
        self.resolve(&self.ingest_file)
    }

    pub fn chain_path(&self) -> PathBuf {
        self.resolve(&self.chain_file)
    }

    /// Lexical containment check; `..` anywhere in the chain path fails.
    fn chain_path_is_contained(&self) -> bool {
        let chain = self.chain_path();
        let escapes = chain
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        !escapes && chain.starts_with(&self.data_dir) && chain != self.data_dir
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl NodeConfig {
    /// Defaults, then `PL_CONFIG`, then environment overrides; validated.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) against an arbitrary variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("PL_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply `PL_*` overrides. Unparseable values are errors, not ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PL_HTTP_PORT") {
            self.api.port = parse_port("PL_HTTP_PORT", value)?;
        }
        if let Some(value) = lookup("PL_GOSSIP_PORT") {
            self.network.gossip_port = parse_port("PL_GOSSIP_PORT", value)?;
        }
        if let Some(value) = lookup("PL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("PL_PEERS") {
            self.network.peers = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = lookup("PL_ADVERTISE_ADDRESS") {
            self.network.advertise_address = Some(value);
        }
        Ok(())
    }

    /// Reject configurations that would start a node that cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods: [(&'static str, Duration); 7] = [
            ("gossip.broadcast_period", self.gossip.broadcast_period),
            ("gossip.listen_period", self.gossip.listen_period),
            ("gossip.cleanup_period", self.gossip.cleanup_period),
            ("gossip.send_timeout", self.gossip.send_timeout),
            ("gossip.read_timeout", self.gossip.read_timeout),
            ("health.poll_interval", self.health.poll_interval),
            ("consensus.idle_poll_interval", self.consensus.idle_poll_interval),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, period)| period.is_zero()) {
            return Err(ConfigError::ZeroPeriod(*name));
        }

        let limits: [(&'static str, u64); 6] = [
            ("health.restart_budget", self.health.restart_budget as u64),
            ("health.restart_window_secs", self.health.restart_window_secs),
            (
                "gossip.max_events_per_message",
                self.gossip.max_events_per_message as u64,
            ),
            ("gossip.inbound_capacity", self.gossip.inbound_capacity as u64),
            ("gossip.max_connections", self.gossip.max_connections as u64),
            ("api.max_body_bytes", self.api.max_body_bytes as u64),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, limit)| *limit == 0) {
            return Err(ConfigError::ZeroLimit(*name));
        }

        if self.health.desync_polls_before_restart < 2 {
            return Err(ConfigError::SinglePollRestart(
                self.health.desync_polls_before_restart,
            ));
        }

        if !self.storage.chain_path_is_contained() {
            return Err(ConfigError::ChainPathOutsideDataDir {
                path: self.storage.chain_path(),
                data_dir: self.storage.data_dir.clone(),
            });
        }

        Ok(())
    }
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
