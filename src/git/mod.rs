//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`. External `git`/`go` commands are run elsewhere only for fetching
//! working copies the way the Go toolchain lays them out.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening (bare or not)
//! - Commit-prefix scans over the whole object database
//! - Ref listing and HEAD management for the source cache
//! - Remote fetches and tree exports
//!
//! # Invariants
//!
//! - All operations return strong types (`Oid`, `RevisionPrefix`)
//! - Prefix scans are independent of object traversal order

mod interface;

pub use interface::{CommitInfo, Git, GitError, RefEntry, RemoteOptions};
