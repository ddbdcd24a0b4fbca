//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and builds the collaborators it needs
//! 2. Calls the engine (or edits the document directly, for `pin`)
//! 3. Prints notices to stderr and the document to stdout or a file
//!
//! Documents are fully assembled before anything is written, and files are
//! replaced atomically.

mod completion;
mod doccopy;
mod gomod;
mod govendor;
mod pin;

pub use completion::completion;
pub use doccopy::{doccopy, escape_module_path};
pub use gomod::gomod;
pub use govendor::govendor;
pub use pin::pin;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::engine::Context;
use crate::gopkg::write_atomic;
use crate::resolve::{FetchConfig, GoGetFetcher, ShaResolver};
use crate::source::GitSourceManager;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Gomod {
            input,
            output,
            go_list,
        } => gomod::gomod(ctx, input.as_deref(), output.as_deref(), go_list),
        Command::Govendor { input, output } => {
            govendor::govendor(ctx, input.as_deref(), output.as_deref())
        }
        Command::Pin {
            name,
            revision,
            server_prefix,
            file,
        } => pin::pin(ctx, &name, &revision, server_prefix.as_deref(), &file),
        Command::Doccopy {
            provider,
            src_org,
            dest_org,
            project_dir,
        } => doccopy::doccopy(ctx, &provider, &src_org, &dest_org, &project_dir),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Interpret `path` relative to `--cwd` when given.
fn resolve_path(ctx: &Context, path: &Path) -> PathBuf {
    match &ctx.cwd {
        Some(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    }
}

/// Read the template from `input`, or stdin.
fn read_input(ctx: &Context, input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => {
            let path = resolve_path(ctx, path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read template from stdin")?;
            Ok(text)
        }
    }
}

/// Write the document to `output`, or stdout.
fn write_output(ctx: &Context, output: Option<&Path>, document: &str) -> Result<()> {
    match output {
        Some(path) => {
            let path = resolve_path(ctx, path);
            write_atomic(&path, document)
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(document.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write document to stdout")
        }
    }
}

fn load_config() -> Result<Config> {
    Config::load().context("failed to load configuration")
}

/// The git-backed source manager over the configured cache.
fn source_manager(config: &Config, ctx: &Context) -> Result<GitSourceManager> {
    let cache_dir = config.cache_dir()?;
    GitSourceManager::new(&cache_dir, config.allow_insecure(), ctx.verbosity)
        .with_context(|| format!("failed to open source cache {}", cache_dir.display()))
}

/// The `go get` backed resolver.
fn resolver(config: &Config, ctx: &Context) -> Result<ShaResolver<GoGetFetcher>> {
    let fetcher = GoGetFetcher::new(FetchConfig::from_config(config))?;
    Ok(ShaResolver::new(fetcher)
        .with_workspace_root(config.workspace_root().map(Path::to_path_buf))
        .with_verbosity(ctx.verbosity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_follow_cwd() {
        let ctx = Context {
            cwd: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        assert_eq!(
            resolve_path(&ctx, Path::new("Gopkg.toml")),
            PathBuf::from("/work/Gopkg.toml")
        );
        assert_eq!(resolve_path(&ctx, Path::new("/abs")), PathBuf::from("/abs"));
        assert_eq!(
            resolve_path(&Context::default(), Path::new("x")),
            PathBuf::from("x")
        );
    }

    #[test]
    fn output_written_atomically() {
        let dir = tempfile::TempDir::new().unwrap();
        let ctx = Context {
            cwd: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        write_output(&ctx, Some(Path::new("out.toml")), "x = 1\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out.toml")).unwrap(),
            "x = 1\n"
        );
        assert_eq!(read_input(&ctx, Some(Path::new("out.toml"))).unwrap(), "x = 1\n");
    }
}
