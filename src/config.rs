use crate::error::LoadError;
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_ENV: &str = "ZCORE_CONFIG";

/// Interpreter settings. Every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Stop with `InstructionLimit` after this many instructions
    pub max_instructions: Option<u64>,
    /// Fixed seed for `random`, for reproducible runs
    pub random_seed: Option<u64>,
    /// Log every instruction at debug level instead of trace
    pub trace_instructions: bool,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config, LoadError> {
        toml::from_str(text).map_err(|e| LoadError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Config, LoadError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| LoadError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Read the file named by `ZCORE_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Config, LoadError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                debug!("loading configuration from {:?}", path);
                Self::from_file(Path::new(&path))
            }
            None => Ok(Config::default()),
        }
    }
}
