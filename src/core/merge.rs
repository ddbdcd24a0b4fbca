//! core::merge
//!
//! Folding package-level locks onto project roots.
//!
//! # Policy
//!
//! - Packages matching an exclusion prefix are dropped before
//!   canonicalization and reported.
//! - The first lock seen for a root is recorded.
//! - A later lock with the same version and revision is a duplicate.
//! - A later lock that disagrees replaces the recorded one only when its
//!   revision time is strictly later. A missing time is the earliest time,
//!   so when both are missing the first-seen lock stays. Every disagreement
//!   produces exactly one [`ConflictWarning`], whichever side wins.
//! - Output is keyed by [`ProjectRoot`] in a `BTreeMap`, so iteration order
//!   is lexicographic regardless of discovery order.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::lock::PackageLock;
use super::types::{ImportPath, ProjectRoot, TypeError};

/// Maps an import path to the project that owns it.
pub trait ProjectCanonicalizer {
    /// Error produced when a path cannot be mapped.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deduce the project root for `path`.
    fn project_root(&self, path: &ImportPath) -> Result<ProjectRoot, Self::Error>;
}

/// Errors from merging.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A lock names a path that is not a valid import path.
    #[error("invalid package path in lock: {path}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// Validation failure
        #[source]
        source: TypeError,
    },

    /// The canonicalizer could not deduce a project root.
    #[error("error deducing project root from path {path}")]
    Canonicalize {
        /// The offending path
        path: String,
        /// Underlying failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// The locks from one vendor file, with that file's exclusions.
#[derive(Debug, Clone, Default)]
pub struct LockSet {
    /// Package path prefixes to ignore.
    pub exclude_prefixes: Vec<String>,
    /// Package locks in file order.
    pub packages: Vec<PackageLock>,
}

/// Two locks for the same project disagreed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictWarning {
    /// The project both locks fold into.
    pub root: ProjectRoot,
    /// The lock recorded before the conflict.
    pub recorded: PackageLock,
    /// The lock that disagreed with it.
    pub candidate: PackageLock,
    /// Package path of the lock that was kept.
    pub chosen: String,
}

impl std::fmt::Display for ConflictWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} version conflict ({} != {}); chose {} (later)",
            self.root,
            self.recorded.describe(),
            self.candidate.describe(),
            self.chosen
        )
    }
}

/// Result of a merge.
#[derive(Debug, Default)]
pub struct MergeOutcome {
    /// One lock per project, sorted by root.
    pub locks: BTreeMap<ProjectRoot, PackageLock>,
    /// Disagreements that were resolved.
    pub warnings: Vec<ConflictWarning>,
    /// Package paths dropped by exclusion prefixes.
    pub excluded: Vec<String>,
}

/// Fold every lock in `sets` onto its project root.
///
/// # Errors
///
/// Fails when a package path is invalid or cannot be canonicalized; no
/// partial outcome is returned.
pub fn merge_locks<C>(sets: &[LockSet], canonicalizer: &C) -> Result<MergeOutcome, MergeError>
where
    C: ProjectCanonicalizer + ?Sized,
{
    let mut outcome = MergeOutcome::default();

    for set in sets {
        for package in &set.packages {
            if set
                .exclude_prefixes
                .iter()
                .any(|prefix| package.path.starts_with(prefix.as_str()))
            {
                outcome.excluded.push(package.path.clone());
                continue;
            }

            let path = ImportPath::new(package.path.as_str()).map_err(|source| {
                MergeError::InvalidPath {
                    path: package.path.clone(),
                    source,
                }
            })?;
            let root = canonicalizer
                .project_root(&path)
                .map_err(|source| MergeError::Canonicalize {
                    path: package.path.clone(),
                    source: Box::new(source),
                })?;

            match outcome.locks.entry(root) {
                Entry::Vacant(entry) => {
                    entry.insert(package.clone());
                }
                Entry::Occupied(mut entry) => {
                    if entry.get().same_pin(package) {
                        continue;
                    }

                    let recorded = entry.get().clone();
                    let replace = is_later(package.revision_time, recorded.revision_time);
                    let chosen = if replace {
                        package.path.clone()
                    } else {
                        recorded.path.clone()
                    };
                    if replace {
                        entry.insert(package.clone());
                    }

                    outcome.warnings.push(ConflictWarning {
                        root: entry.key().clone(),
                        recorded,
                        candidate: package.clone(),
                        chosen,
                    });
                }
            }
        }
    }

    Ok(outcome)
}

/// Strictly-later comparison where a missing time is the earliest time.
fn is_later(candidate: Option<DateTime<Utc>>, recorded: Option<DateTime<Utc>>) -> bool {
    match (candidate, recorded) {
        (Some(c), Some(r)) => c > r,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
