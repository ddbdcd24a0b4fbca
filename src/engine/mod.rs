//! engine
//!
//! The two override pipelines.
//!
//! # Pipelines
//!
//! ```text
//! gomod:    template -> first gomod-override constraint -> select + export
//!           -> go.mod / go list -> classify -> resolve -> emit
//! govendor: template -> every govendor-override constraint -> select + export
//!           -> vendor.json locks -> merge per project -> classify -> emit
//! ```
//!
//! Both are written against [`SourceManager`] and [`RevisionResolver`], so
//! tests drive them with the in-memory source manager and a fixed resolver.
//!
//! # Invariants
//!
//! - Any error aborts the run before a document is produced.
//! - Previously injected overrides are removed before new ones are appended.
//! - Notices (skipped replacements, conflicts, exclusions) are returned, not
//!   printed; the CLI decides how to show them.

pub mod gomod;
pub mod govendor;

pub use gomod::{gomod_overrides, ManifestSource};
pub use govendor::govendor_overrides;

use std::path::PathBuf;

use tempfile::TempDir;
use thiserror::Error;

use crate::core::constraint::ResolvedConstraint;
use crate::core::merge::{ConflictWarning, MergeError};
use crate::gopkg::{GopkgEntry, GopkgError};
use crate::manifest::{ManifestError, SkippedReplacement};
use crate::resolve::BuildError;
use crate::source::{select_version, SourceError, SourceManager, SourceVersion};
use crate::ui::output::{self, Verbosity};

/// Execution context shared by the pipelines.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Diagnostic verbosity.
    pub verbosity: Verbosity,
}

/// Errors from the pipelines.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The template could not be read or requests nothing.
    #[error(transparent)]
    Gopkg(#[from] GopkgError),

    /// A project could not be listed or exported.
    #[error("error fetching {project}")]
    Source {
        /// The project
        project: String,
        /// Underlying failure
        #[source]
        source: SourceError,
    },

    /// A scratch directory could not be created.
    #[error("failed to create export directory")]
    Scratch(#[source] std::io::Error),

    /// A dependency manifest could not be read.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A requirement or lock could not be turned into a constraint.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Locks could not be merged.
    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Something the user should hear about that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A replacement pointed at a local directory.
    Skipped(SkippedReplacement),
    /// Two locks for one project disagreed.
    Conflict(ConflictWarning),
    /// A package matched an exclusion prefix.
    Excluded {
        /// The package path
        path: String,
    },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Skipped(skipped) => write!(f, "{}", skipped),
            Notice::Conflict(conflict) => write!(f, "{}", conflict),
            Notice::Excluded { path } => write!(f, "excluding package {}", path),
        }
    }
}

/// The result of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// The complete output document.
    pub document: String,
    /// The constraints emitted, in output order.
    pub constraints: Vec<ResolvedConstraint>,
    /// Number of previously injected overrides removed.
    pub stripped: usize,
    /// Non-fatal notices.
    pub notices: Vec<Notice>,
}

impl Report {
    /// Print every notice as a warning.
    pub fn print_notices(&self, verbosity: Verbosity) {
        for notice in &self.notices {
            output::warn(notice, verbosity);
        }
    }
}

/// A project tree exported into a scratch directory.
struct Export {
    dir: TempDir,
    version: SourceVersion,
}

/// Select the best version of `entry`'s project and export it.
fn export_selected<S>(sm: &S, entry: &GopkgEntry, ctx: &Context) -> Result<Export, EngineError>
where
    S: SourceManager + ?Sized,
{
    let project = entry.project()?;
    let source_error = |source| EngineError::Source {
        project: project.to_string(),
        source,
    };

    let matcher = entry.matcher();
    let versions = sm.list_versions(&project).map_err(source_error)?;
    let version = select_version(versions, &matcher).ok_or_else(|| {
        source_error(SourceError::NoMatchingVersion {
            project: project.to_string(),
            matcher: matcher.to_string(),
        })
    })?;
    output::debug(format!("{}: selected {}", project, version), ctx.verbosity);

    let dir = tempfile::Builder::new()
        .prefix("gopin-export-")
        .tempdir()
        .map_err(EngineError::Scratch)?;
    sm.export_project(&project, &version, dir.path())
        .map_err(source_error)?;

    Ok(Export { dir, version })
}
