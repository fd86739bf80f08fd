//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use crate::format::ColorChoice;
use libsweep::{Config, Result};
use std::env;
use std::path::{Path, PathBuf};

/// How much the CLI reports about what it is doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    #[default]
    Normal,
    Verbose,
    VeryVerbose,
    Trace,
}

impl VerbosityLevel {
    /// Map the number of `-v` flags to a level
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::VeryVerbose,
            _ => VerbosityLevel::Trace,
        }
    }
}

/// Application context with resolved configuration and runtime state
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    /// Path the configuration was loaded from, if any
    pub config_path: Option<PathBuf>,
    pub color: ColorChoice,
    pub verbosity: VerbosityLevel,
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    ///
    /// An explicit `config_path` must exist. Without one, the default path is
    /// used when a file is present there.
    pub fn build(
        config_path: Option<&Path>,
        cli_color: ColorChoice,
        verbosity: VerbosityLevel,
    ) -> Result<Self> {
        // 1 + 2. Defaults merged with the config file
        let config_path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path().filter(|path| path.is_file()),
        };
        let config = Config::load(config_path.as_deref())?;

        // 3. Environment variable overrides
        let env_color = env::var("SWEEP_COLOR").ok().map(|c| ColorChoice::from(c.as_str()));

        // 4. CLI flag overrides (highest priority). Auto is clap's default, so
        // it only wins over the environment when nothing else was set.
        let color = match (cli_color, env_color) {
            (ColorChoice::Auto, Some(env_color)) => env_color,
            (cli_color, _) => cli_color,
        };

        Ok(Self {
            config,
            config_path,
            color,
            verbosity,
        })
    }

    /// Returns true when messages at `level` should be shown
    pub fn shows(&self, level: VerbosityLevel) -> bool {
        self.verbosity >= level
    }
}

/// Default configuration file: `<config dir>/sweep/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sweep").join("config.yaml"))
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
