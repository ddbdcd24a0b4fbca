//! doccopy command - Copy a provider's module-cache directory into vendor/
//!
//! `go mod vendor` only copies packages, so documentation and other
//! non-Go files of a provider are missing from `vendor/`. This command
//! copies the provider's whole module directory from the module cache.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context as _, Result};

use super::resolve_path;
use crate::engine::Context;
use crate::manifest::gomod::GO_MOD;
use crate::manifest::modules_txt::{self, MODULES_TXT};
use crate::ui::output;

/// Copy `github.com/<src_org>/<provider>` into `vendor/github.com/<dest_org>/<provider>`.
pub fn doccopy(
    ctx: &Context,
    provider: &str,
    src_org: &str,
    dest_org: &str,
    project_dir: &Path,
) -> Result<()> {
    let project_dir = resolve_path(ctx, project_dir);
    let gopath = gopath()?;
    let dest = copy_provider(&project_dir, &gopath, provider, src_org, dest_org)?;
    output::info(format!("copied into {}", dest.display()), ctx.verbosity);
    Ok(())
}

/// The first `GOPATH` entry, or `~/go`.
fn gopath() -> Result<PathBuf> {
    if let Some(value) = std::env::var_os("GOPATH") {
        if let Some(first) = std::env::split_paths(&value).find(|p| !p.as_os_str().is_empty()) {
            return Ok(first);
        }
    }
    dirs::home_dir()
        .map(|home| home.join("go"))
        .ok_or_else(|| anyhow!("GOPATH is not set and the home directory is unknown"))
}

/// Escape a module path or version the way the module cache stores it:
/// every uppercase letter becomes `!` followed by its lowercase form.
pub fn escape_module_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn copy_provider(
    project_dir: &Path,
    gopath: &Path,
    provider: &str,
    src_org: &str,
    dest_org: &str,
) -> Result<PathBuf> {
    for required in [GO_MOD, MODULES_TXT] {
        if !project_dir.join(required).is_file() {
            bail!("{} not found in {}", required, project_dir.display());
        }
    }

    let modules_path = project_dir.join(MODULES_TXT);
    let text = fs::read_to_string(&modules_path)
        .with_context(|| format!("failed to read {}", modules_path.display()))?;
    let modules = modules_txt::parse(&text);

    let module_path = format!("github.com/{}/{}", src_org, provider);
    let module = modules_txt::find(&modules, &module_path)
        .ok_or_else(|| anyhow!("{} is not listed in {}", module_path, MODULES_TXT))?;

    let source = gopath.join("pkg").join("mod").join(format!(
        "{}@{}",
        escape_module_path(&module.path),
        escape_module_path(&module.version)
    ));
    if !source.is_dir() {
        bail!(
            "{} not found in the module cache; run `go mod download` first",
            source.display()
        );
    }

    let dest = project_dir
        .join("vendor")
        .join("github.com")
        .join(dest_org)
        .join(provider);
    if dest.exists() {
        fs::remove_dir_all(&dest).with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    copy_dir(&source, &dest)
        .with_context(|| format!("failed to copy {} to {}", source.display(), dest.display()))?;
    Ok(dest)
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
