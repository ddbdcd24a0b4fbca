//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables (`GOPIN_WORKSPACE`, `GOPIN_ALLOW_INSECURE`)
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. `$GOPIN_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gopin/config.toml`
//! 3. `~/.gopin/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use gopin::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("go binary: {}", config.go_binary());
//! println!("insecure: {}", config.allow_insecure());
//! ```

pub mod schema;

pub use schema::{FetchSettings, FileConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GOPIN_CONFIG";

/// Environment variable overriding the working-copy root.
pub const WORKSPACE_ENV: &str = "GOPIN_WORKSPACE";

/// Environment variable permitting insecure fetches when non-empty.
pub const INSECURE_ENV: &str = "GOPIN_ALLOW_INSECURE";

const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_MS: u64 = 1000;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("no cache directory available; set cache_dir in the config file")]
    NoCacheDir,
}

/// Merged configuration from the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Values from the config file
    pub file: FileConfig,
    /// `GOPIN_WORKSPACE`, if set
    workspace_override: Option<PathBuf>,
    /// `GOPIN_ALLOW_INSECURE` was set non-empty
    insecure_override: bool,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment and default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation. A missing file is not an error.
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration, reading environment variables through `env`.
    ///
    /// The process environment is never modified.
    pub fn load_with<F>(env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (file, path) = Self::load_file(&env)?;
        file.validate()?;

        Ok(Config {
            file,
            workspace_override: env(WORKSPACE_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            insecure_override: env(INSECURE_ENV).is_some_and(|v| !v.is_empty()),
            path,
        })
    }

    fn load_file<F>(env: &F) -> Result<(FileConfig, Option<PathBuf>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. Check $GOPIN_CONFIG
        if let Some(path) = env(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/gopin/config.toml
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gopin/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.gopin/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".gopin/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((FileConfig::default(), None))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Persistent working-copy root for SHA resolution.
    ///
    /// `None` means every resolution uses a fresh temporary directory.
    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_override
            .as_deref()
            .or(self.file.workspace_root.as_deref())
    }

    /// Whether insecure transport is permitted.
    ///
    /// Defaults to `false`.
    pub fn allow_insecure(&self) -> bool {
        self.insecure_override || self.file.allow_insecure.unwrap_or(false)
    }

    /// The `go` executable.
    ///
    /// Defaults to `go` on `PATH`.
    pub fn go_binary(&self) -> &str {
        self.file.go_binary.as_deref().unwrap_or("go")
    }

    /// Root of the source manager's clone cache.
    ///
    /// Defaults to `<platform cache dir>/gopin`.
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.file.cache_dir {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|d| d.join("gopin"))
            .ok_or(ConfigError::NoCacheDir)
    }

    /// Per-attempt fetch timeout.
    ///
    /// Defaults to five minutes.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(
            self.fetch_settings()
                .and_then(|f| f.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Retries after a retryable fetch failure.
    ///
    /// Defaults to 2.
    pub fn fetch_retries(&self) -> u32 {
        self.fetch_settings()
            .and_then(|f| f.retries)
            .unwrap_or(DEFAULT_RETRIES)
    }

    /// Initial delay between fetch retries.
    ///
    /// Defaults to one second.
    pub fn fetch_backoff(&self) -> Duration {
        Duration::from_millis(
            self.fetch_settings()
                .and_then(|f| f.backoff_ms)
                .unwrap_or(DEFAULT_BACKOFF_MS),
        )
    }

    fn fetch_settings(&self) -> Option<&FetchSettings> {
        self.file.fetch.as_ref()
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent.toml");
        let config =
            Config::load_with(env_of(&[(CONFIG_ENV, missing.to_str().unwrap())])).unwrap();

        // A config in the real home directory may still be found; only
        // environment-driven values are asserted.
        assert!(config.loaded_from() != Some(missing.as_path()));
    }

    #[test]
    fn load_from_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
            go_binary = "/opt/go/bin/go"
            allow_insecure = true

            [fetch]
            retries = 0
            "#,
        )
        .unwrap();

        let config = Config::load_with(env_of(&[(CONFIG_ENV, path.to_str().unwrap())])).unwrap();
        assert_eq!(config.go_binary(), "/opt/go/bin/go");
        assert!(config.allow_insecure());
        assert_eq!(config.fetch_retries(), 0);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(300));
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn environment_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "workspace_root = \"/from/file\"\n").unwrap();

        let config = Config::load_with(env_of(&[
            (CONFIG_ENV, path.to_str().unwrap()),
            (WORKSPACE_ENV, "/from/env"),
            (INSECURE_ENV, "1"),
        ]))
        .unwrap();
        assert_eq!(config.workspace_root(), Some(Path::new("/from/env")));
        assert!(config.allow_insecure());
    }

    #[test]
    fn empty_insecure_variable_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load_with(env_of(&[
            (CONFIG_ENV, path.to_str().unwrap()),
            (INSECURE_ENV, ""),
        ]))
        .unwrap();
        assert!(!config.allow_insecure());
        assert!(config.workspace_root().is_none());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "unknown_field = true\n").unwrap();

        let result = Config::load_with(env_of(&[(CONFIG_ENV, path.to_str().unwrap())]));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[fetch]\ntimeout_secs = 0\n").unwrap();

        let result = Config::load_with(env_of(&[(CONFIG_ENV, path.to_str().unwrap())]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn explicit_cache_dir_wins() {
        let config = Config {
            file: FileConfig {
                cache_dir: Some(PathBuf::from("/cache")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/cache"));
    }
}
