//! core
//!
//! Core domain types and the reconciliation algorithms.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RevisionPrefix, ImportPath, ProjectRoot
//! - [`version`] - Version string classification
//! - [`constraint`] - The normalized pin emitted per project
//! - [`lock`] - Package-level vendor locks
//! - [`merge`] - Folding package locks onto project roots
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Nothing here performs network or process I/O
//! - All folding is deterministic

pub mod config;
pub mod constraint;
pub mod lock;
pub mod merge;
pub mod types;
pub mod version;
