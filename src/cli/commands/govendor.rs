//! govendor command - Inject overrides from vendored package locks

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{load_config, read_input, resolver, source_manager, write_output};
use crate::engine::{self, Context};
use crate::ui::output;

/// Run the govendor pipeline.
pub fn govendor(ctx: &Context, input: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let template = read_input(ctx, input)?;

    let sm = source_manager(&config, ctx)?;
    let resolver = resolver(&config, ctx)?;

    let report = engine::govendor_overrides(&template, &sm, &resolver, ctx)
        .context("govendor override failed")?;
    report.print_notices(ctx.verbosity);
    if report.stripped > 0 {
        output::debug(
            format!("removed {} previously injected overrides", report.stripped),
            ctx.verbosity,
        );
    }
    output::info(
        format!("injected {} overrides", report.constraints.len()),
        ctx.verbosity,
    );

    write_output(ctx, out, &report.document)
}
