//! core::config::schema
//!
//! Configuration schema types.
//!
//! Located at (in order of precedence):
//! 1. `$GOPIN_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gopin/config.toml`
//! 3. `~/.gopin/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing (timeouts must be positive,
//! paths non-empty).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Tool configuration.
///
/// # Example
///
/// ```toml
/// workspace_root = "/var/tmp/gopin-gopath"
/// allow_insecure = false
/// go_binary = "go"
/// cache_dir = "/home/me/.cache/gopin"
///
/// [fetch]
/// timeout_secs = 300
/// retries = 2
/// backoff_ms = 1000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Persistent working-copy root for SHA resolution
    pub workspace_root: Option<PathBuf>,

    /// Permit insecure transport during fetches
    pub allow_insecure: Option<bool>,

    /// The `go` executable
    pub go_binary: Option<String>,

    /// Root of the source manager's clone cache
    pub cache_dir: Option<PathBuf>,

    /// Fetch behavior
    pub fetch: Option<FetchSettings>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(root) = &self.workspace_root {
            if root.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "workspace_root cannot be empty".to_string(),
                ));
            }
        }

        if let Some(go) = &self.go_binary {
            if go.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "go_binary cannot be empty".to_string(),
                ));
            }
        }

        if let Some(fetch) = &self.fetch {
            fetch.validate()?;
        }

        Ok(())
    }
}

/// Fetch timeout and retry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
    /// Per-attempt timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Retries after a retryable failure
    pub retries: Option<u32>,

    /// Initial backoff between retries, doubled each time
    pub backoff_ms: Option<u64>,
}

impl FetchSettings {
    /// Validate the fetch settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "fetch.timeout_secs must be positive".to_string(),
            ));
        }
        if let Some(retries) = self.retries {
            if retries > 10 {
                return Err(ConfigError::InvalidValue(format!(
                    "fetch.retries of {} is more than 10",
                    retries
                )));
            }
        }
        Ok(())
    }
}
