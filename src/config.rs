use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use config::{Config, Environment, File};
use thiserror::Error;

const ENVIRONMENT_PREFIX: &str = "ROOKERY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("The configuration has already been initialized")]
    ConfigAlreadyInitialized,

    #[error("Unable to read the configuration: {0}")]
    UnableToReadConfig(#[from] config::ConfigError),
}

/// Configuration of the command line front end
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RookeryConfig {
    /// Number of threads to use for the perft command
    pub perft_threads: u32,
    /// Depth used by the perft command when none is given
    pub perft_depth: u16,
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for RookeryConfig {
    fn default() -> Self {
        Self { perft_threads: 1, perft_depth: 4, log_level: "warn".to_string() }
    }
}

static CONFIG: OnceLock<RookeryConfig> = OnceLock::new();

/// Reads the configuration.
///
/// Values are taken from, in increasing order of priority: the defaults, the TOML file at `path`
/// if one is given, and the `ROOKERY_*` environment variables (e.g. `ROOKERY_PERFT_THREADS=8`).
pub fn load(path: Option<&Path>) -> Result<RookeryConfig, ConfigError> {
    let defaults = RookeryConfig::default();
    let mut builder = Config::builder()
        .set_default("perft_threads", i64::from(defaults.perft_threads))?
        .set_default("perft_depth", i64::from(defaults.perft_depth))?
        .set_default("log_level", defaults.log_level)?;

    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }

    let settings = builder.add_source(Environment::with_prefix(ENVIRONMENT_PREFIX)).build()?;
    Ok(settings.try_deserialize()?)
}

/// Get the configuration, falling back to the defaults if it was never initialized
pub fn get_config() -> &'static RookeryConfig {
    CONFIG.get_or_init(RookeryConfig::default)
}

/// Initialize the configuration. This can only be done once, before the first `get_config`.
pub fn initialize(path: Option<PathBuf>) -> Result<&'static RookeryConfig, ConfigError> {
    let config = load(path.as_deref())?;
    CONFIG.set(config).map_err(|_| ConfigError::ConfigAlreadyInitialized)?;

    Ok(get_config())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.perft_depth, 4);
        assert!(config.perft_threads >= 1);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("rookery-config-{}.toml", std::process::id()));
        std::fs::write(&path, "perft_depth = 6\nlog_level = \"debug\"\n").unwrap();

        let config = load(Some(&path));
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.perft_depth, 6);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("rookery-config-that-does-not-exist.toml");
        assert!(matches!(load(Some(&path)), Err(ConfigError::UnableToReadConfig(_))));
    }
}
