//! pin command - Pin a project to a revision in Gopkg.toml

use std::path::Path;

use anyhow::{Context as _, Result};

use super::resolve_path;
use crate::engine::Context;
use crate::gopkg::{write_atomic, GopkgDocument};
use crate::ui::output;

/// Replace the constraint for `name` with an override pinned to `revision`.
pub fn pin(
    ctx: &Context,
    name: &str,
    revision: &str,
    server_prefix: Option<&str>,
    file: &Path,
) -> Result<()> {
    let path = resolve_path(ctx, file);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut doc = GopkgDocument::parse(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let outcome = doc
        .pin(name, revision, server_prefix)
        .with_context(|| format!("cannot pin {} in {}", name, path.display()))?;
    if outcome.removed_constraint {
        output::debug(format!("removed constraint {}", name), ctx.verbosity);
    }
    output::info(
        format!(
            "{} override {} at {}",
            if outcome.replaced_override { "replaced" } else { "added" },
            name,
            revision
        ),
        ctx.verbosity,
    );

    write_atomic(&path, &doc.render())
        .with_context(|| format!("failed to write {}", path.display()))
}
