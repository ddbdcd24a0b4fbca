//! gopkg::emit
//!
//! Rendering resolved constraints as `[[override]]` blocks, and reading such
//! blocks back.

use super::{GopkgEntry, GopkgError, OverrideTool};
use crate::core::constraint::{ConstraintValue, ResolvedConstraint};
use crate::core::types::Oid;

/// The comment placed above a tool's overrides.
pub fn header(tool: OverrideTool) -> &'static str {
    match tool {
        OverrideTool::GoMod => {
            "# NOTE: the following overrides were generated by gopin gomod from go.mod requirements."
        }
        OverrideTool::GoVendor => {
            "# NOTE: the following overrides were injected by gopin govendor. It may be necessary to\n\
             # remove some of these overrides in order to produce a buildable vendor tree."
        }
    }
}

fn quoted(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

/// Render `constraints` in order, each marked as injected by `tool`.
///
/// An empty slice renders as an empty string.
pub fn emit(constraints: &[ResolvedConstraint], tool: OverrideTool) -> String {
    if constraints.is_empty() {
        return String::new();
    }

    let mut out = format!("\n{}\n", header(tool));
    for c in constraints {
        out.push_str("\n[[override]]\n");
        out.push_str(&format!("  name = {}\n", quoted(c.name())));
        out.push_str(&format!("  {} = {}\n", c.kind().key(), quoted(c.value().as_str())));
        if let Some(source) = c.source() {
            out.push_str(&format!("  source = {}\n", quoted(source)));
        }
        out.push_str("  [override.metadata]\n");
        out.push_str(&format!("    {} = true\n", tool.marker_key()));
    }
    out
}

/// Append rendered overrides to a template's text.
pub fn append(template: &str, constraints: &[ResolvedConstraint], tool: OverrideTool) -> String {
    let mut out = template.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&emit(constraints, tool));
    out
}

/// Read every `[[override]]` in `text` as a constraint.
///
/// Each override must pin exactly one of version, revision or branch, and a
/// revision must be a full hash.
pub fn parse_overrides(text: &str) -> Result<Vec<ResolvedConstraint>, GopkgError> {
    let doc = super::GopkgDocument::parse(text)?;
    doc.overrides().iter().map(to_constraint).collect()
}

fn to_constraint(entry: &GopkgEntry) -> Result<ResolvedConstraint, GopkgError> {
    let invalid = |message: String| GopkgError::InvalidOverride {
        name: entry.name.clone(),
        message,
    };

    let value = match (&entry.version, &entry.revision, &entry.branch) {
        (Some(v), None, None) => ConstraintValue::Version(v.clone()),
        (None, Some(r), None) => ConstraintValue::Revision(
            Oid::new(r.as_str()).map_err(|e| invalid(e.to_string()))?,
        ),
        (None, None, Some(b)) => ConstraintValue::Branch(b.clone()),
        (None, None, None) => return Err(invalid("no version, revision or branch".into())),
        _ => return Err(invalid("more than one of version, revision and branch".into())),
    };

    let constraint = ResolvedConstraint::new(entry.name.as_str(), value);
    Ok(match &entry.source {
        Some(source) => constraint.with_source(source.as_str()),
        None => constraint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constraint::ConstraintKind;

    const FULL: &str = "b4deda0973fb4c70b50d226b1af49f3da59f5265";

    fn sample() -> Vec<ResolvedConstraint> {
        vec![
            ResolvedConstraint::new(
                "github.com/pkg/errors",
                ConstraintValue::Version("=v0.8.1".into()),
            ),
            ResolvedConstraint::new(
                "golang.org/x/net",
                ConstraintValue::Revision(Oid::new(FULL).unwrap()),
            )
            .with_source("github.com/golang/net"),
            ResolvedConstraint::new("github.com/acme/lib", ConstraintValue::Branch("master".into())),
        ]
    }

    #[test]
    fn block_format() {
        let out = emit(&sample()[..2], OverrideTool::GoMod);
        let expected = format!(
            "\n{}\n\n[[override]]\n  name = \"github.com/pkg/errors\"\n  version = \"=v0.8.1\"\n  [override.metadata]\n    gomod-overridden = true\n\n[[override]]\n  name = \"golang.org/x/net\"\n  revision = \"{}\"\n  source = \"github.com/golang/net\"\n  [override.metadata]\n    gomod-overridden = true\n",
            header(OverrideTool::GoMod),
            FULL
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn empty_renders_nothing() {
        assert_eq!(emit(&[], OverrideTool::GoVendor), "");
        assert_eq!(append("x = 1", &[], OverrideTool::GoVendor), "x = 1\n");
    }

    #[test]
    fn values_are_escaped() {
        let c = ResolvedConstraint::new("example.com/a", ConstraintValue::Branch("we\"ird".into()));
        let out = emit(&[c], OverrideTool::GoVendor);
        let back = parse_overrides(&out).unwrap();
        assert_eq!(back[0].value().as_str(), "we\"ird");
    }

    #[test]
    fn output_reads_back_and_is_marked() {
        let template = "[[constraint]]\n  name = \"github.com/acme/app\"\n  branch = \"master\"\n";
        let text = append(template, &sample(), OverrideTool::GoVendor);

        assert_eq!(parse_overrides(&text).unwrap(), sample());

        let mut doc = super::super::GopkgDocument::parse(&text).unwrap();
        assert_eq!(doc.strip_injected(OverrideTool::GoVendor), 3);
        assert_eq!(doc.strip_injected(OverrideTool::GoMod), 0);
    }

    #[test]
    fn ambiguous_override_rejected() {
        let text = "[[override]]\n  name = \"a.com/b\"\n  version = \"=v1.0.0\"\n  branch = \"master\"\n";
        assert!(matches!(
            parse_overrides(text),
            Err(GopkgError::InvalidOverride { .. })
        ));
    }

    #[test]
    fn abbreviated_revision_rejected() {
        let text = "[[override]]\n  name = \"a.com/b\"\n  revision = \"abc1234\"\n";
        let err = parse_overrides(text).unwrap_err();
        assert!(matches!(err, GopkgError::InvalidOverride { .. }));
        assert_eq!(ConstraintKind::Revision.key(), "revision");
    }
}
