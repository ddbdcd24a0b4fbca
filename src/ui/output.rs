//! ui::output
//!
//! Diagnostic output and verbosity.
//!
//! # Design
//!
//! Diagnostics are written to stderr and respect the quiet flag. Errors are
//! always shown. Debug traces appear only with `--verbose`.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Quiet mode - errors only
    Quiet,
    /// Normal mode - progress and warnings
    #[default]
    Normal,
    /// Verbose mode - adds debug traces
    Verbose,
}

impl Verbosity {
    /// Create verbosity from flags.
    ///
    /// Quiet wins when both are given.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Whether warnings and progress are shown.
    pub fn shows_warnings(self) -> bool {
        self != Verbosity::Quiet
    }

    /// Whether debug traces are shown.
    pub fn shows_debug(self) -> bool {
        self == Verbosity::Verbose
    }
}

/// Print a progress message (respects quiet mode).
pub fn info(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_warnings() {
        eprintln!("{}", message);
    }
}

/// Print a debug message (only in verbose mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_debug() {
        eprintln!("[debug] {}", message);
    }
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_warnings() {
        eprintln!("warning: {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Format a list of items, one per line.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
