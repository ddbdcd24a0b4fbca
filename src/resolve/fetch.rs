//! resolve::fetch
//!
//! Materializing a dependency's repository in a GOPATH-style workspace.
//!
//! # Behavior
//!
//! [`GoGetFetcher`] runs `go get -u -d [-insecure] <path>` with `GOPATH` and
//! `GO111MODULE=off` set on the child only. A non-zero exit is accepted when
//! the output shows the download succeeded but there was nothing to build
//! (see [`is_benign_failure`]). Each attempt runs under a timeout; timeouts and
//! failures that look like transient network trouble are retried with
//! exponential backoff.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use thiserror::Error;

use crate::core::config::Config;
use crate::core::types::ImportPath;

/// Output fragments that mark a failure as worth retrying.
const TRANSIENT_MARKERS: &[&str] = &[
    "could not resolve host",
    "connection timed out",
    "connection reset",
    "connection refused",
    "tls handshake timeout",
    "i/o timeout",
    "early eof",
    "unexpected eof",
    "502 bad gateway",
    "503 service unavailable",
    "504 gateway timeout",
];

/// Errors from fetching a repository.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch command could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that was invoked
        program: String,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// An attempt exceeded its timeout and was killed.
    #[error("fetching {import_path} timed out after {}s", timeout.as_secs())]
    TimedOut {
        /// Path being fetched
        import_path: String,
        /// The per-attempt limit
        timeout: Duration,
    },

    /// The fetch command failed.
    #[error("failed to fetch {import_path}:\n{output}")]
    Failed {
        /// Path being fetched
        import_path: String,
        /// Combined stdout and stderr
        output: String,
    },

    /// The async runtime could not be created.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl FetchError {
    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::TimedOut { .. } => true,
            FetchError::Failed { output, .. } => is_transient(output),
            FetchError::Spawn { .. } | FetchError::Runtime(_) => false,
        }
    }
}

/// Materializes the repository that provides an import path.
pub trait Fetcher {
    /// Fetch `import_path` into the GOPATH rooted at `root`.
    ///
    /// Returns the directory the package landed in (`<root>/src/<path>`).
    fn fetch(&self, import_path: &ImportPath, root: &Path) -> Result<PathBuf, FetchError>;
}

/// How `go get` is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// The `go` executable
    pub go_binary: String,
    /// Pass `-insecure`
    pub allow_insecure: bool,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retries after a retryable failure
    pub retries: u32,
    /// First delay between attempts, doubled after each retry
    pub backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            go_binary: "go".to_string(),
            allow_insecure: false,
            timeout: Duration::from_secs(300),
            retries: 2,
            backoff: Duration::from_secs(1),
        }
    }
}

impl FetchConfig {
    /// Take fetch settings from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            go_binary: config.go_binary().to_string(),
            allow_insecure: config.allow_insecure(),
            timeout: config.fetch_timeout(),
            retries: config.fetch_retries(),
            backoff: config.fetch_backoff(),
        }
    }

    /// Arguments passed to the `go` binary.
    pub fn args(&self, import_path: &ImportPath) -> Vec<String> {
        let mut args = vec!["get".to_string(), "-u".to_string()];
        if self.allow_insecure {
            args.push("-insecure".to_string());
        }
        args.push("-d".to_string());
        args.push(import_path.to_string());
        args
    }
}

/// Fetches with `go get` in GOPATH mode.
#[derive(Debug)]
pub struct GoGetFetcher {
    config: FetchConfig,
    runtime: tokio::runtime::Runtime,
}

impl GoGetFetcher {
    /// Create a fetcher.
    ///
    /// # Errors
    ///
    /// [`FetchError::Runtime`] if the timer runtime cannot be built.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FetchError::Runtime)?;
        Ok(Self { config, runtime })
    }

    /// The configuration in use.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn attempt(&self, import_path: &ImportPath, root: &Path) -> Result<(), FetchError> {
        let mut command = tokio::process::Command::new(&self.config.go_binary);
        command
            .args(self.config.args(import_path))
            .env("GOPATH", root)
            .env("GO111MODULE", "off")
            .current_dir(root);

        let output = self.runtime.block_on(run_timed(
            command,
            self.config.timeout,
            import_path.as_str(),
        ))?;

        if output.status.success() {
            return Ok(());
        }

        let text = combined_output(&output);
        if is_benign_failure(&text, root) {
            return Ok(());
        }
        Err(FetchError::Failed {
            import_path: import_path.to_string(),
            output: text,
        })
    }
}

impl Fetcher for GoGetFetcher {
    fn fetch(&self, import_path: &ImportPath, root: &Path) -> Result<PathBuf, FetchError> {
        let mut delay = self.config.backoff;
        let mut attempt = 0;
        loop {
            match self.attempt(import_path, root) {
                Ok(()) => return Ok(root.join("src").join(import_path.as_str())),
                Err(err) if err.is_retryable() && attempt < self.config.retries => {
                    attempt += 1;
                    self.runtime.block_on(async { tokio::time::sleep(delay).await });
                    delay = delay.saturating_mul(2);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Run `command` to completion, killing it once `timeout` elapses.
///
/// `subject` names what is being fetched in the timeout error.
pub async fn run_timed(
    mut command: tokio::process::Command,
    timeout: Duration,
    subject: &str,
) -> Result<Output, FetchError> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    command
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(FetchError::Spawn { program, source }),
        Err(_) => Err(FetchError::TimedOut {
            import_path: subject.to_string(),
            timeout,
        }),
    }
}

/// Whether a failed `go get` still left the sources in place.
///
/// `-d` stops after downloading, but `go get` still complains when the path
/// has no buildable Go files for this platform.
pub fn is_benign_failure(output: &str, root: &Path) -> bool {
    let no_go_files = format!("no Go files in {}", root.display());
    output.contains(&no_go_files) || output.contains("build constraints exclude all Go files")
}

fn is_transient(output: &str) -> bool {
    let lower = output.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
