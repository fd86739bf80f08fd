//! Application configuration.
//!
//! This module manages library configuration with sensible defaults, loaded
//! from a YAML file and merged over the defaults.

use crate::error::{Result, SweepError};
use crate::models::TagStatus;
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;


/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub registry: Registry,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub retry: Retry,
    #[serde(default)]
    pub retention: Retention,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    ///
    /// This function is primarily used for testing.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(ConfigRs::try_from(&Config::default())?)
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder, None)
    }

    /// Loads a `Config` from an optional file path.
    ///
    /// With no path, the defaults are returned. A path that is given must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigRs::builder().add_source(ConfigRs::try_from(&Config::default())?);

        if let Some(p) = path {
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }

        Self::from_builder(builder, path)
    }

    /// Creates a `Config` from a `config::ConfigBuilder`.
    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&Path>,
    ) -> Result<Self> {
        let config: Config = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                SweepError::config_with_source(
                    "Failed to deserialize configuration".to_string(),
                    path.map(|p| p.display().to_string()),
                    e,
                )
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that cannot produce a working client.
    pub fn validate(&self) -> Result<()> {
        if self.registry.region.is_some() && self.registry.base_url.is_some() {
            return Err(SweepError::config(
                "registry.region and registry.base_url are mutually exclusive",
                None,
            ));
        }
        if self.network.read_timeout == 0 {
            return Err(SweepError::config(
                "network.read_timeout must be at least one second",
                None,
            ));
        }
        Ok(())
    }
}

/// Registry endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Registry {
    /// One of `fr-par`, `nl-ams`, `pl-waw`.
    #[serde(default)]
    pub region: Option<String>,

    /// Explicit API base URL, used instead of a region.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Network settings, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_read_timeout() -> u64 {
    20
}

/// Maintenance retry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Retry {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Upper bound of a single backoff sleep, in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay: u64,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_delay: default_max_delay(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_delay() -> u64 {
    30
}

/// Retention defaults applied when the caller gives no explicit value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Retention {
    #[serde(default = "default_exclude_statuses")]
    pub exclude_statuses: Vec<TagStatus>,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            exclude_statuses: default_exclude_statuses(),
        }
    }
}

fn default_exclude_statuses() -> Vec<TagStatus> {
    vec![TagStatus::Deleting]
}
