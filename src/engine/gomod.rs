//! engine::gomod
//!
//! Overrides from the `go.mod` of the project a template asks to expand.

use std::time::Duration;

use super::{export_selected, Context, EngineError, Notice, Report};
use crate::core::constraint::ResolvedConstraint;
use crate::gopkg::emit::append;
use crate::gopkg::{GopkgDocument, OverrideTool};
use crate::manifest::gomod::GoMod;
use crate::manifest::{golist, Requirements};
use crate::resolve::{build_constraint, RevisionResolver};
use crate::source::SourceManager;
use crate::ui::output;

/// Where the requirement list comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ManifestSource {
    /// Parse the exported `go.mod` directly.
    #[default]
    GoMod,
    /// Run `go list -json -m all` in the export.
    GoList {
        /// The go tool to run
        go_binary: String,
        /// Limit on the command
        timeout: Duration,
    },
}

/// Run the gomod pipeline over `template`.
///
/// # Errors
///
/// Fails when no constraint requests `gomod-override`, when the project
/// cannot be exported, when a version is malformed, or when an abbreviated
/// revision does not resolve to exactly one commit.
pub fn gomod_overrides<S, R>(
    template: &str,
    sm: &S,
    resolver: &R,
    manifest: &ManifestSource,
    ctx: &Context,
) -> Result<Report, EngineError>
where
    S: SourceManager + ?Sized,
    R: RevisionResolver + ?Sized,
{
    let mut doc = GopkgDocument::parse(template)?;
    let request = doc.first_override_request(OverrideTool::GoMod)?;
    let stripped = doc.strip_injected(OverrideTool::GoMod);

    let export = export_selected(sm, &request.constraint, ctx)?;
    let requirements = match manifest {
        ManifestSource::GoMod => GoMod::read(export.dir.path())?.effective_requirements(),
        ManifestSource::GoList { go_binary, timeout } => {
            let stream = golist::run_go_list(go_binary, export.dir.path(), *timeout)?;
            golist::requirements(&golist::parse_stream(&stream, "go list")?)
        }
    };
    output::debug(
        format!(
            "{}@{}: {} requirements",
            request.constraint.name,
            export.version,
            requirements.requirements.len()
        ),
        ctx.verbosity,
    );

    let Requirements {
        requirements,
        skipped,
    } = requirements;

    let mut constraints = Vec::with_capacity(requirements.len());
    for req in &requirements {
        let built = build_constraint(&req.target, &req.version, resolver)?;
        let constraint = if req.is_replaced() {
            ResolvedConstraint::new(req.name.as_str(), built.value().clone())
                .with_source(req.target.as_str())
        } else {
            built
        };
        output::debug(format!("  {}", constraint), ctx.verbosity);
        constraints.push(constraint);
    }

    Ok(Report {
        document: append(&doc.render(), &constraints, OverrideTool::GoMod),
        constraints,
        stripped,
        notices: skipped.into_iter().map(Notice::Skipped).collect(),
    })
}
