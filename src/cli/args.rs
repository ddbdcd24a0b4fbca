//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--verbose` / `-v`: Debug traces on stderr
//! - `--quiet` / `-q`: Errors only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::ui::output::Verbosity;

/// gopin - Reconcile go.mod and govendor pins into Gopkg.toml overrides
#[derive(Parser, Debug)]
#[command(name = "gopin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gopin was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Print debug traces
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Verbosity selected by the global flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inject overrides from a dependency's go.mod
    #[command(
        name = "gomod",
        long_about = "Inject overrides from a dependency's go.mod.\n\n\
            Reads a Gopkg.toml template and finds the first [[constraint]] whose \
            metadata sets gomod-override. The best matching version of that project \
            is exported and its go.mod requirements are turned into [[override]] \
            blocks. Pseudo-versions with abbreviated hashes are expanded by fetching \
            the dependency and scanning its history.\n\n\
            Overrides injected by a previous run are removed first.",
        after_help = "\
EXAMPLES:
    # Template on stdin, result on stdout
    gopin gomod < Gopkg.toml.in > Gopkg.toml

    # Use the go tool's resolved build list instead of parsing go.mod
    gopin gomod --input Gopkg.toml.in --output Gopkg.toml --go-list"
    )]
    Gomod {
        /// Template to read (default: stdin)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// File to write (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Read requirements from `go list -json -m all`
        #[arg(long)]
        go_list: bool,
    },

    /// Inject overrides from dependencies' vendor/vendor.json
    #[command(
        name = "govendor",
        long_about = "Inject overrides from dependencies' vendor/vendor.json.\n\n\
            Every [[constraint]] whose metadata sets govendor-override is exported \
            and its vendored package locks are collected. Locks are folded onto \
            their project roots; when two disagree the one with the later revision \
            time wins and a warning is printed. Packages matching the constraint's \
            govendor-exclude-prefixes are ignored.",
        after_help = "\
EXAMPLES:
    gopin govendor --input Gopkg.toml.in --output Gopkg.toml"
    )]
    Govendor {
        /// Template to read (default: stdin)
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// File to write (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Pin a project to a revision in Gopkg.toml
    #[command(
        name = "pin",
        long_about = "Pin a project to a revision in Gopkg.toml.\n\n\
            Removes the [[constraint]] for the project and sets (or adds) an \
            [[override]] pinned to the revision. With --server-prefix the override's \
            source is the prefix joined with its existing source or name.",
        after_help = "\
EXAMPLES:
    gopin pin --name github.com/pkg/errors --revision 645ef00459ed84a119197bfb8d8205042c6df63d \\
        --server-prefix https://git.example.com/mirror"
    )]
    Pin {
        /// Project name
        #[arg(long)]
        name: String,

        /// Revision to pin
        #[arg(long)]
        revision: String,

        /// URL prefix for the override's source
        #[arg(long)]
        server_prefix: Option<String>,

        /// The Gopkg.toml to edit
        #[arg(long, default_value = "Gopkg.toml")]
        file: PathBuf,
    },

    /// Copy a provider's docs from the module cache into vendor/
    #[command(
        name = "doccopy",
        long_about = "Copy a provider's module-cache directory into vendor/.\n\n\
            Looks up github.com/<src-org>/<provider> in vendor/modules.txt, finds the \
            matching directory in $GOPATH/pkg/mod, and copies it to \
            vendor/github.com/<dest-org>/<provider>, replacing what was there."
    )]
    Doccopy {
        /// Provider repository name
        #[arg(long)]
        provider: String,

        /// Organization the module is published under
        #[arg(long, default_value = "terraform-providers")]
        src_org: String,

        /// Organization to vendor it under
        #[arg(long, default_value = "terraform-providers")]
        dest_org: String,

        /// Project containing go.mod and vendor/
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    gopin completion bash > /etc/bash_completion.d/gopin
    gopin completion zsh > \"${fpath[1]}/_gopin\""
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
