//! manifest
//!
//! Readers for the dependency manifests the pipelines consume.
//!
//! # Modules
//!
//! - [`gomod`] - `go.mod` require/replace/exclude directives
//! - [`golist`] - The `go list -json -m all` object stream
//! - [`vendor`] - govendor's `vendor/vendor.json`
//! - [`modules_txt`] - `vendor/modules.txt` written by `go mod vendor`
//!
//! Each reader yields plain `(path, version)` pairs or package locks; version
//! interpretation happens later, in classification.

pub mod golist;
pub mod gomod;
pub mod modules_txt;
pub mod vendor;

use thiserror::Error;

use crate::resolve::fetch::FetchError;

/// Errors from reading manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A line could not be parsed.
    #[error("{file}:{line}: {message}")]
    Parse {
        /// File being parsed
        file: String,
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// A JSON document could not be decoded.
    #[error("error parsing JSON from {file}")]
    Json {
        /// File or command the JSON came from
        file: String,
        /// Decoder failure
        #[source]
        source: serde_json::Error,
    },

    /// Running a command that produces a manifest failed.
    #[error("error running {command}")]
    Command {
        /// The command line
        command: String,
        /// Underlying failure
        #[source]
        source: FetchError,
    },

    /// A command that produces a manifest exited unsuccessfully.
    #[error("{command} failed:\n{output}")]
    CommandFailed {
        /// The command line
        command: String,
        /// Its stderr
        output: String,
    },
}

/// A dependency to pin, after replacements are applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Requirement {
    /// The dependency as the requiring module names it
    pub name: String,
    /// Path the version belongs to (the replacement, if any)
    pub target: String,
    /// Version to pin
    pub version: String,
}

impl Requirement {
    /// A requirement with no replacement.
    pub fn direct(path: impl Into<String>, version: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: path.clone(),
            target: path,
            version: version.into(),
        }
    }

    /// Whether the version comes from a different module path.
    pub fn is_replaced(&self) -> bool {
        self.name != self.target
    }
}

/// A replacement that cannot be pinned because it points at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedReplacement {
    /// The replaced module
    pub path: String,
    /// The local directory it points at
    pub directory: String,
}

impl std::fmt::Display for SkippedReplacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "skipping {}: replaced by local directory {}",
            self.path, self.directory
        )
    }
}

/// Requirements read from a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    /// Pinnable requirements, sorted by name
    pub requirements: Vec<Requirement>,
    /// Local replacements that were dropped
    pub skipped: Vec<SkippedReplacement>,
}

/// Whether a replacement target is a filesystem path rather than a module.
pub fn is_local_path(path: &str) -> bool {
    path.starts_with("./")
        || path.starts_with("../")
        || path.starts_with('/')
        || path == "."
        || path == ".."
        || (path.len() > 1 && path.as_bytes()[1] == b':')
}
