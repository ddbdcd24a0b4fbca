//! ui
//!
//! User-facing diagnostics.
//!
//! # Modules
//!
//! - [`output`] - Verbosity levels and stderr diagnostics
//!
//! # Design
//!
//! Documents produced by a command go to stdout or a file. Everything else
//! (progress, warnings, debug traces) goes through this module to stderr, so
//! piping a command's output into a file never captures diagnostics.

pub mod output;
