//! gopin - Reconcile Go dependency pins into dep overrides
//!
//! gopin translates version declarations from module-aware `go.mod` files
//! and govendor's `vendor/vendor.json` locks into `[[override]]` blocks of a
//! dep `Gopkg.toml`. Pseudo-versions that embed an abbreviated commit hash
//! are expanded against the dependency's real history, and package locks
//! that disagree within one project are merged deterministically.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - The gomod and govendor override pipelines
//! - [`core`] - Domain types, version classification, lock merging, config
//! - [`resolve`] - Abbreviated hash expansion and constraint building
//! - [`source`] - Project deduction, version listing and export
//! - [`manifest`] - go.mod, `go list`, vendor.json and modules.txt readers
//! - [`gopkg`] - Gopkg.toml reading, editing and override emission
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Diagnostic output
//!
//! # Correctness Invariants
//!
//! 1. A revision pin is always a full commit hash
//! 2. An abbreviated hash resolves to exactly one commit or the run fails
//! 3. Output is assembled completely before anything is written
//! 4. Hand-written Gopkg.toml content is preserved byte for byte

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod gopkg;
pub mod manifest;
pub mod resolve;
pub mod source;
pub mod ui;
