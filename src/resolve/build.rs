//! resolve::build
//!
//! Building [`ResolvedConstraint`]s from manifest entries and vendor locks.
//!
//! Classification is pure; the resolver is consulted only when a
//! pseudo-version carries an abbreviated hash (or a lock records one), so
//! the result is deterministic whenever the resolver is.

use thiserror::Error;

use super::{ResolveError, RevisionResolver};
use crate::core::constraint::{ConstraintValue, ResolvedConstraint};
use crate::core::lock::PackageLock;
use crate::core::types::{
    ImportPath, Oid, ProjectRoot, RevisionPrefix, TypeError, SHA1_HEX_LEN, SHA256_HEX_LEN,
};
use crate::core::version::{classify, parse_go_semver, VersionError, VersionKind, INCOMPATIBLE_SUFFIX};

/// Errors from building a constraint.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The version string is malformed.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The entry's path is not a valid import path.
    #[error("invalid import path {path}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// Validation failure
        #[source]
        source: TypeError,
    },

    /// A lock records a revision that is not a hash.
    #[error("invalid revision {revision:?} for {path}")]
    InvalidRevision {
        /// Package path of the lock
        path: String,
        /// The recorded revision
        revision: String,
        /// Validation failure
        #[source]
        source: TypeError,
    },

    /// A lock records neither a version nor a revision.
    #[error("lock for {path} has neither version nor revision")]
    EmptyLock {
        /// Package path of the lock
        path: String,
    },

    /// Expanding an abbreviated hash failed.
    #[error("failed to resolve revision for {path}")]
    Resolve {
        /// Path being resolved
        path: String,
        /// Underlying failure
        #[source]
        source: ResolveError,
    },
}

/// Build the constraint for a `go.mod` style `(path, version)` pair.
///
/// # Example
///
/// ```ignore
/// let c = build_constraint("example.com/foo", "v1.2.3+incompatible", &resolver)?;
/// assert_eq!(c.value().as_str(), "=v1.2.3");
/// ```
pub fn build_constraint<R>(
    path: &str,
    version: &str,
    resolver: &R,
) -> Result<ResolvedConstraint, BuildError>
where
    R: RevisionResolver + ?Sized,
{
    let classified = classify(path, version)?;

    let value = match classified.kind {
        VersionKind::Exact(v) => ConstraintValue::Version(v),
        VersionKind::Branch(b) => ConstraintValue::Branch(b),
        VersionKind::Revision(oid) => ConstraintValue::Revision(oid),
        VersionKind::AbbreviatedRevision(prefix) => {
            ConstraintValue::Revision(expand(path, &prefix, resolver)?)
        }
    };

    Ok(ResolvedConstraint::new(path, value))
}

/// Build the constraint for the lock chosen for `root`.
///
/// An exact tag is preferred over the requested version. Without any
/// version the lock pins its revision, expanding it when abbreviated.
/// Semantic versions, prerelease tags included, are pinned with `=`;
/// anything else is a branch.
pub fn build_lock_constraint<R>(
    root: &ProjectRoot,
    lock: &PackageLock,
    resolver: &R,
) -> Result<ResolvedConstraint, BuildError>
where
    R: RevisionResolver + ?Sized,
{
    let version = if lock.version_exact.is_empty() {
        lock.version.trim()
    } else {
        lock.version_exact.trim()
    };

    let value = if version.is_empty() {
        ConstraintValue::Revision(lock_revision(root, lock, resolver)?)
    } else {
        let stripped = version.strip_suffix(INCOMPATIBLE_SUFFIX).unwrap_or(version);
        match parse_go_semver(stripped) {
            Some(_) => ConstraintValue::Version(format!("={}", stripped)),
            None => ConstraintValue::Branch(version.to_string()),
        }
    };

    Ok(ResolvedConstraint::new(root.as_str(), value))
}

fn lock_revision<R>(root: &ProjectRoot, lock: &PackageLock, resolver: &R) -> Result<Oid, BuildError>
where
    R: RevisionResolver + ?Sized,
{
    let revision = lock.revision.trim();
    if revision.is_empty() {
        return Err(BuildError::EmptyLock {
            path: lock.path.clone(),
        });
    }

    let invalid = |source| BuildError::InvalidRevision {
        path: lock.path.clone(),
        revision: revision.to_string(),
        source,
    };

    match revision.len() {
        SHA1_HEX_LEN | SHA256_HEX_LEN => Oid::new(revision).map_err(invalid),
        _ => {
            let prefix = RevisionPrefix::new(revision).map_err(invalid)?;
            expand(root.as_str(), &prefix, resolver)
        }
    }
}

fn expand<R>(path: &str, prefix: &RevisionPrefix, resolver: &R) -> Result<Oid, BuildError>
where
    R: RevisionResolver + ?Sized,
{
    let import_path = ImportPath::new(path).map_err(|source| BuildError::InvalidPath {
        path: path.to_string(),
        source,
    })?;
    resolver
        .resolve(&import_path, prefix)
        .map_err(|source| BuildError::Resolve {
            path: path.to_string(),
            source,
        })
}
