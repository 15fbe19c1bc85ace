//! Configuration file support.
//!
//! This module defines the structure of the optional `simulta.toml` file and
//! how its values combine with command-line options into a `RunRequest`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::framing::FramingPolicy;
use crate::runner::RunRequest;

/// File looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "simulta.toml";

/// Top-level configuration structure corresponding to `simulta.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Commands to run when none are given on the command line.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Labels for the commands, one per command.
    pub names: Option<Vec<String>>,
    /// Whether to prefix output lines (default: false).
    pub prefix: Option<bool>,
    /// Framing policy ("line" or "chunk").
    pub framing: Option<FramingPolicy>,
    /// Whether to strip ANSI escapes from command output (default: false).
    pub strip_ansi: Option<bool>,
    /// Shell used to run commands.
    pub shell: Option<String>,
}

/// Values taken from the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub commands: Vec<String>,
    pub names: Option<Vec<String>>,
    pub prefix: bool,
    pub framing: Option<FramingPolicy>,
    pub strip_ansi: bool,
    pub shell: Option<String>,
}

impl Config {
    /// Builds the run request, letting command-line values win.
    ///
    /// Commands from the command line replace the configured list instead of
    /// extending it, so configured names never shift onto other commands.
    pub fn into_request(self, overrides: Overrides) -> RunRequest {
        let cli_commands = !overrides.commands.is_empty();
        let commands = if cli_commands {
            overrides.commands
        } else {
            self.commands
        };
        let names = match overrides.names {
            Some(names) => Some(names),
            None if cli_commands => None,
            None => self.names,
        };
        RunRequest {
            commands,
            names,
            prefix: overrides.prefix || self.prefix.unwrap_or(false),
            framing: overrides.framing.or(self.framing).unwrap_or_default(),
            strip_ansi: overrides.strip_ansi || self.strip_ansi.unwrap_or(false),
            shell: overrides.shell.or(self.shell),
        }
    }
}

/// Loads and parses the configuration from a file path.
pub fn load_config(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Picks the config file to use: an explicit path, or `simulta.toml` in the
/// current directory if it exists.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        Some(path.to_path_buf())
    } else {
        None
    }
}
