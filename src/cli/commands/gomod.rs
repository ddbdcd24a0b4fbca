//! gomod command - Inject overrides from a dependency's go.mod

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{load_config, read_input, resolver, source_manager, write_output};
use crate::engine::{self, Context, ManifestSource};
use crate::ui::output;

/// Run the gomod pipeline.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `input` - Template path, stdin when `None`
/// * `out` - Output path, stdout when `None`
/// * `go_list` - Take requirements from `go list -json -m all`
pub fn gomod(ctx: &Context, input: Option<&Path>, out: Option<&Path>, go_list: bool) -> Result<()> {
    let config = load_config()?;
    let template = read_input(ctx, input)?;

    let sm = source_manager(&config, ctx)?;
    let resolver = resolver(&config, ctx)?;
    let manifest = if go_list {
        ManifestSource::GoList {
            go_binary: config.go_binary().to_string(),
            timeout: config.fetch_timeout(),
        }
    } else {
        ManifestSource::GoMod
    };

    let report = engine::gomod_overrides(&template, &sm, &resolver, &manifest, ctx)
        .context("gomod override failed")?;
    report.print_notices(ctx.verbosity);
    output::info(
        format!("injected {} overrides", report.constraints.len()),
        ctx.verbosity,
    );

    write_output(ctx, out, &report.document)
}
