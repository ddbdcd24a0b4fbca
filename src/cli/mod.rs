//! cli
//!
//! Command-line interface layer for gopin.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Build the real collaborators (source manager, resolver) from configuration
//! - Delegate to command handlers
//!
//! The pipelines themselves live in [`crate::engine`] and never touch stdin,
//! stdout or the process environment.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        verbosity: cli.verbosity(),
    };

    commands::dispatch(cli.command, &ctx)
}
