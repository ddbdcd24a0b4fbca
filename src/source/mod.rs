//! source
//!
//! Access to dependency repositories.
//!
//! # Modules
//!
//! - [`traits`] - The `SourceManager` trait, versions and matching
//! - [`deduce`] - Import path to project root deduction
//! - [`vanity`] - `?go-get=1` meta tag lookups
//! - [`git_source`] - Git-backed manager with an on-disk clone cache
//! - [`mock`] - In-memory manager for tests

pub mod deduce;
pub mod git_source;
pub mod mock;
pub mod traits;
pub mod vanity;

pub use git_source::GitSourceManager;
pub use traits::{
    select_version, sort_for_upgrade, ProjectIdentifier, SourceCanonicalizer, SourceError,
    SourceManager, SourceVersion, VersionMatcher,
};
