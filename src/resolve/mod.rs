//! resolve
//!
//! Expanding abbreviated commit hashes against real repository history.
//!
//! # Modules
//!
//! - [`fetch`] - Materializing a repository with `go get`
//! - [`build`] - Turning versions and locks into constraints
//!
//! # Policy
//!
//! A prefix must name exactly one commit. Zero matches is
//! [`ResolveError::MissingRevision`] and two or more is
//! [`ResolveError::AmbiguousRevision`], so the answer never depends on the
//! order objects happen to be stored in.
//!
//! # Example
//!
//! ```ignore
//! use gopin::resolve::{RevisionResolver, ShaResolver};
//! use gopin::resolve::fetch::{FetchConfig, GoGetFetcher};
//!
//! let resolver = ShaResolver::new(GoGetFetcher::new(FetchConfig::default())?);
//! let oid = resolver.resolve(&path, &prefix)?;
//! ```

pub mod build;
pub mod fetch;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{ImportPath, Oid, RevisionPrefix};
use crate::git::{Git, GitError};
use crate::ui::output::{self, Verbosity};

pub use build::{build_constraint, build_lock_constraint, BuildError};
pub use fetch::{FetchConfig, FetchError, Fetcher, GoGetFetcher};

/// Errors from revision resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The working copy could not be prepared.
    #[error("failed to prepare workspace: {0}")]
    Workspace(#[source] std::io::Error),

    /// The repository could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetched repository could not be read.
    #[error("failed to scan history of {import_path}")]
    Scan {
        /// Path whose repository was scanned
        import_path: String,
        /// Underlying failure
        #[source]
        source: GitError,
    },

    /// No commit has the prefix.
    #[error("failed to find revision {prefix} in {import_path}")]
    MissingRevision {
        /// The abbreviated hash
        prefix: RevisionPrefix,
        /// Path whose repository was scanned
        import_path: String,
    },

    /// Several commits share the prefix.
    #[error("revision {prefix} is ambiguous in {import_path}; candidates:\n{}", output::format_list(candidates, "  "))]
    AmbiguousRevision {
        /// The abbreviated hash
        prefix: RevisionPrefix,
        /// Path whose repository was scanned
        import_path: String,
        /// Every matching commit
        candidates: Vec<Oid>,
    },
}

/// Expands an abbreviated hash to the full commit id.
pub trait RevisionResolver {
    /// Find the single commit in `import_path`'s history starting with `prefix`.
    fn resolve(&self, import_path: &ImportPath, prefix: &RevisionPrefix)
        -> Result<Oid, ResolveError>;
}

/// Where fetched repositories are placed.
enum Workspace {
    /// A configured root, left in place afterwards.
    Persistent(PathBuf),
    /// A private directory removed when dropped.
    Temporary(tempfile::TempDir),
}

impl Workspace {
    fn path(&self) -> &Path {
        match self {
            Workspace::Persistent(path) => path,
            Workspace::Temporary(dir) => dir.path(),
        }
    }
}

/// Resolves prefixes by fetching the repository and scanning every commit.
#[derive(Debug)]
pub struct ShaResolver<F> {
    fetcher: F,
    workspace_root: Option<PathBuf>,
    verbosity: Verbosity,
}

impl<F: Fetcher> ShaResolver<F> {
    /// Create a resolver that fetches into a fresh temporary directory per call.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            workspace_root: None,
            verbosity: Verbosity::Normal,
        }
    }

    /// Fetch into `root` instead, and leave it there.
    pub fn with_workspace_root(mut self, root: Option<PathBuf>) -> Self {
        self.workspace_root = root;
        self
    }

    /// The fetcher in use.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Set the verbosity for debug traces.
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    fn workspace(&self) -> Result<Workspace, ResolveError> {
        match &self.workspace_root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(ResolveError::Workspace)?;
                Ok(Workspace::Persistent(root.clone()))
            }
            None => tempfile::Builder::new()
                .prefix("gopin-")
                .tempdir()
                .map(Workspace::Temporary)
                .map_err(ResolveError::Workspace),
        }
    }
}

impl<F: Fetcher> RevisionResolver for ShaResolver<F> {
    fn resolve(
        &self,
        import_path: &ImportPath,
        prefix: &RevisionPrefix,
    ) -> Result<Oid, ResolveError> {
        let workspace = self.workspace()?;
        output::debug(
            format!(
                "fetching {} into {} to expand {}",
                import_path,
                workspace.path().display(),
                prefix
            ),
            self.verbosity,
        );

        let package_dir = self.fetcher.fetch(import_path, workspace.path())?;
        let oid = scan_for_prefix(&package_dir, import_path, prefix)?;

        if self.verbosity.shows_debug() {
            if let Ok(info) = Git::open(&package_dir).and_then(|git| git.commit_info(&oid)) {
                output::debug(
                    format!(
                        "{} {} -> {} ({}, {})",
                        import_path,
                        prefix,
                        oid,
                        info.commit_time.format("%Y-%m-%d"),
                        info.summary
                    ),
                    self.verbosity,
                );
            }
        }
        Ok(oid)
    }
}

/// Find the single commit starting with `prefix` in the repository
/// containing `dir`.
///
/// # Errors
///
/// - [`ResolveError::Scan`] if no repository contains `dir`
/// - [`ResolveError::MissingRevision`] if no commit matches
/// - [`ResolveError::AmbiguousRevision`] if several commits match
pub fn scan_for_prefix(
    dir: &Path,
    import_path: &ImportPath,
    prefix: &RevisionPrefix,
) -> Result<Oid, ResolveError> {
    let scan_error = |source| ResolveError::Scan {
        import_path: import_path.to_string(),
        source,
    };

    let git = Git::open(dir).map_err(scan_error)?;
    let mut matches = git.commits_with_prefix(prefix).map_err(scan_error)?;

    match matches.len() {
        0 => Err(ResolveError::MissingRevision {
            prefix: prefix.clone(),
            import_path: import_path.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(ResolveError::AmbiguousRevision {
            prefix: prefix.clone(),
            import_path: import_path.to_string(),
            candidates: matches,
        }),
    }
}
