//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! gopin. All repository reads (history scans, ref listing) and writes
//! (cache fetches, tree exports) flow through this interface, which returns
//! strong types and normalizes errors into typed failure categories.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: No repository at or above the given path
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::ObjectNotFound`]: Requested object does not exist
//! - [`GitError::Remote`]: Talking to a remote failed
//!
//! # Example
//!
//! ```ignore
//! use gopin::core::types::RevisionPrefix;
//! use gopin::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let matches = git.commits_with_prefix(&RevisionPrefix::new("abc1234")?)?;
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{Oid, RevisionPrefix, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Connecting to or fetching from a remote failed.
    #[error("remote {url}: {message}")]
    Remote {
        /// The remote URL
        url: String,
        /// The error message
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn remote(err: git2::Error, url: &str) -> Self {
        GitError::Remote {
            url: url.to_string(),
            message: err.message().to_string(),
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::InvalidOid {
            oid: err.to_string(),
        }
    }
}

/// A ref with its name and peeled commit OID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    /// The full ref name
    pub name: String,
    /// The commit the ref points to
    pub oid: Oid,
}

/// Information about a commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Committer timestamp
    pub commit_time: chrono::DateTime<chrono::Utc>,
}

/// Transport options for remote operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteOptions {
    /// Skip TLS certificate verification.
    pub allow_insecure: bool,
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2` directly.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open a repository at or above the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` may be a sub-package
    /// directory inside a clone. Bare repositories are accepted.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Open the bare repository at `path`, creating it if absent.
    pub fn open_or_init_bare(path: &Path) -> Result<Self, GitError> {
        match git2::Repository::open_bare(path) {
            Ok(repo) => Ok(Self { repo }),
            Err(_) => {
                let repo = git2::Repository::init_bare(path)
                    .map_err(|e| GitError::from_git2(e, &path.display().to_string()))?;
                Ok(Self { repo })
            }
        }
    }

    /// Get the .git directory path (the repository itself when bare).
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // History Scanning
    // =========================================================================

    /// Find every commit whose full id starts with `prefix`.
    ///
    /// Visits every object in the object database, reachable or not, in the
    /// database's native order. Only commits are returned; blobs and trees
    /// sharing the prefix are ignored. The result is sorted and de-duplicated
    /// so callers see the same answer regardless of pack layout.
    pub fn commits_with_prefix(&self, prefix: &RevisionPrefix) -> Result<Vec<Oid>, GitError> {
        let odb = self.repo.odb()?;

        let mut candidates = BTreeSet::new();
        odb.foreach(|oid| {
            if oid.to_string().starts_with(prefix.as_str()) {
                candidates.insert(*oid);
            }
            true
        })?;

        let mut commits = Vec::new();
        for oid in candidates {
            let (_, kind) = odb
                .read_header(oid)
                .map_err(|e| GitError::from_git2(e, &oid.to_string()))?;
            if kind == git2::ObjectType::Commit {
                commits.push(Oid::new(oid.to_string())?);
            }
        }

        Ok(commits)
    }

    /// Get information about a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::ObjectNotFound`] if the commit doesn't exist
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self.find_commit(oid)?;
        let commit_time = chrono::DateTime::from_timestamp(commit.time().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH);

        Ok(CommitInfo {
            oid: oid.clone(),
            summary: commit.summary().unwrap_or("").to_string(),
            commit_time,
        })
    }

    fn find_commit(&self, oid: &Oid) -> Result<git2::Commit<'_>, GitError> {
        let git_oid =
            git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        self.repo
            .find_commit(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    // =========================================================================
    // Refs
    // =========================================================================

    /// List refs under `prefix` (e.g. `refs/tags/`), peeled to commits.
    ///
    /// Refs that do not peel to a commit (tags of blobs, say) are skipped.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<RefEntry>, GitError> {
        let pattern = format!("{}*", prefix);
        let refs = self.repo.references_glob(&pattern)?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference?;
            let Some(name) = reference.name() else {
                continue;
            };
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };
            entries.push(RefEntry {
                name: name.to_string(),
                oid: Oid::new(commit.id().to_string())?,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Point HEAD at `refs/heads/<branch>`.
    pub fn set_head_branch(&self, branch: &str) -> Result<(), GitError> {
        let refname = format!("refs/heads/{}", branch);
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))
    }

    /// The branch HEAD points at, if HEAD is symbolic.
    pub fn head_branch(&self) -> Result<Option<String>, GitError> {
        let head = self
            .repo
            .find_reference("HEAD")
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        Ok(head
            .symbolic_target()
            .and_then(|t| t.strip_prefix("refs/heads/"))
            .map(String::from))
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Fetch `refspecs` from `url` into this repository.
    ///
    /// Returns the remote's default branch name, when it advertises one.
    pub fn fetch(
        &self,
        url: &str,
        refspecs: &[&str],
        options: RemoteOptions,
    ) -> Result<Option<String>, GitError> {
        let mut remote = self
            .repo
            .remote_anonymous(url)
            .map_err(|e| GitError::remote(e, url))?;

        let default_branch = {
            let connection = remote
                .connect_auth(
                    git2::Direction::Fetch,
                    Some(remote_callbacks(options)),
                    None,
                )
                .map_err(|e| GitError::remote(e, url))?;
            connection
                .default_branch()
                .ok()
                .and_then(|buf| buf.as_str().map(String::from))
                .and_then(|name| name.strip_prefix("refs/heads/").map(String::from))
        };

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(options));
        fetch_options.download_tags(git2::AutotagOption::All);
        remote
            .fetch(refspecs, Some(&mut fetch_options), None)
            .map_err(|e| GitError::remote(e, url))?;

        Ok(default_branch)
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Write the tree of commit `oid` into `dest`.
    ///
    /// Works on bare repositories; the repository's own index and HEAD are
    /// left untouched.
    pub fn export_tree(&self, oid: &Oid, dest: &Path) -> Result<(), GitError> {
        let commit = self.find_commit(oid)?;
        let tree = commit
            .tree()
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        std::fs::create_dir_all(dest).map_err(|e| GitError::AccessError {
            message: format!("cannot create {}: {}", dest.display(), e),
        })?;

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout
            .target_dir(dest)
            .force()
            .recreate_missing(true)
            .update_index(false);
        self.repo
            .checkout_tree(tree.as_object(), Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }
}

fn remote_callbacks<'a>(options: RemoteOptions) -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    if options.allow_insecure {
        callbacks.certificate_check(|_, _| Ok(git2::CertificateCheckStatus::CertificateOk));
    }
    callbacks
}
