//! Configuration for the wallet adapter

pub mod version_source;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

// Re-export version source config
pub use version_source::VersionSource;

/// Bitcoin networks understood by this library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Testnet4,
    Signet,
    FractalMainnet,
    FractalTestnet,
}

impl Network {
    pub const ALL: [Network; 6] = [
        Network::Mainnet,
        Network::Testnet,
        Network::Testnet4,
        Network::Signet,
        Network::FractalMainnet,
        Network::FractalTestnet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Testnet4 => "testnet4",
            Network::Signet => "signet",
            Network::FractalMainnet => "fractal_mainnet",
            Network::FractalTestnet => "fractal_testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Network::ALL
            .into_iter()
            .find(|network| network.name() == normalized)
            .ok_or_else(|| Error::InvalidArgument(format!("Unknown network: {}", s)))
    }
}

fn default_probe_interval_ms() -> u64 {
    250
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network selected when the client starts
    #[serde(default)]
    pub network: Network,
    /// Interval between wallet availability probes (milliseconds)
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,
    /// Where the published package manifest is fetched from
    #[serde(default)]
    pub version_source: VersionSource,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Defaults, with the version source taken from the environment
    pub fn from_env() -> Self {
        Self {
            version_source: VersionSource::from_env(),
            ..Self::default()
        }
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            probe_interval_ms: default_probe_interval_ms(),
            version_source: VersionSource::default(),
        }
    }
}
