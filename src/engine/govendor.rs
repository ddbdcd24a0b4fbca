//! engine::govendor
//!
//! Overrides from the `vendor/vendor.json` locks of every project a template
//! asks to expand, merged per project.

use super::{export_selected, Context, EngineError, Notice, Report};
use crate::core::merge::{merge_locks, LockSet};
use crate::gopkg::emit::append;
use crate::gopkg::{GopkgDocument, OverrideTool};
use crate::manifest::vendor::VendorFile;
use crate::resolve::{build_lock_constraint, RevisionResolver};
use crate::source::{SourceCanonicalizer, SourceManager};
use crate::ui::output;

/// Run the govendor pipeline over `template`.
///
/// A template requesting nothing yields the template with previously
/// injected overrides removed. Constraints are emitted sorted by project.
pub fn govendor_overrides<S, R>(
    template: &str,
    sm: &S,
    resolver: &R,
    ctx: &Context,
) -> Result<Report, EngineError>
where
    S: SourceManager + ?Sized,
    R: RevisionResolver + ?Sized,
{
    let mut doc = GopkgDocument::parse(template)?;
    let requests = doc.override_requests(OverrideTool::GoVendor)?;
    let stripped = doc.strip_injected(OverrideTool::GoVendor);

    let mut sets = Vec::with_capacity(requests.len());
    for request in requests {
        let export = export_selected(sm, &request.constraint, ctx)?;
        let vendor = VendorFile::read(export.dir.path())?;
        output::debug(
            format!(
                "{}@{}: {} vendored packages",
                request.constraint.name,
                export.version,
                vendor.package.len()
            ),
            ctx.verbosity,
        );
        sets.push(LockSet {
            exclude_prefixes: request.exclude_prefixes,
            packages: vendor.package,
        });
    }

    let merged = merge_locks(&sets, &SourceCanonicalizer(sm))?;

    let mut constraints = Vec::with_capacity(merged.locks.len());
    for (root, lock) in &merged.locks {
        constraints.push(build_lock_constraint(root, lock, resolver)?);
    }

    let notices = merged
        .excluded
        .into_iter()
        .map(|path| Notice::Excluded { path })
        .chain(merged.warnings.into_iter().map(Notice::Conflict))
        .collect();

    Ok(Report {
        document: append(&doc.render(), &constraints, OverrideTool::GoVendor),
        constraints,
        stripped,
        notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ImportPath, Oid, ProjectRoot, RevisionPrefix};
    use crate::gopkg::emit::parse_overrides;
    use crate::gopkg::GopkgError;
    use crate::resolve::ResolveError;
    use crate::source::mock::MockSourceManager;
    use crate::source::SourceVersion;

    struct Unused;

    impl RevisionResolver for Unused {
        fn resolve(&self, path: &ImportPath, prefix: &RevisionPrefix) -> Result<Oid, ResolveError> {
            Err(ResolveError::MissingRevision {
                prefix: prefix.clone(),
                import_path: path.to_string(),
            })
        }
    }

    const TEMPLATE: &str = r#"[[constraint]]
  name = "github.com/acme/app"
  branch = "master"
  [constraint.metadata]
    govendor-override = true
    govendor-exclude-prefixes = ["github.com/acme/"]

[[constraint]]
  name = "github.com/acme/tool"
  [constraint.metadata]
    govendor-override = true

[[override]]
  name = "github.com/old/dep"
  revision = "0000000000000000000000000000000000000000"
  [override.metadata]
    govendor-overriden = true
"#;

    const APP_VENDOR: &str = r#"{
	"package": [
		{"path": "github.com/pkg/errors", "revision": "1111111111111111111111111111111111111111", "revisionTime": "2017-01-01T00:00:00Z", "version": "v0.8.0", "versionExact": "v0.8.0"},
		{"path": "golang.org/x/net/context", "revision": "2222222222222222222222222222222222222222", "revisionTime": "2018-01-01T00:00:00Z"},
		{"path": "github.com/acme/shared/util", "revision": "3333333333333333333333333333333333333333"}
	]
}"#;

    const TOOL_VENDOR: &str = r#"{
	"package": [
		{"path": "golang.org/x/net/http2", "revision": "4444444444444444444444444444444444444444", "revisionTime": "2019-01-01T00:00:00Z"},
		{"path": "github.com/sirupsen/logrus", "revision": "5555555555555555555555555555555555555555", "version": "master"}
	]
}"#;

    fn manager() -> MockSourceManager {
        let app = ProjectRoot::new("github.com/acme/app").unwrap();
        let tool = ProjectRoot::new("github.com/acme/tool").unwrap();
        let app_rev = Oid::new("a".repeat(40)).unwrap();
        let tool_rev = Oid::new("b".repeat(40)).unwrap();
        MockSourceManager::new()
            .with_version(
                &app,
                SourceVersion::Branch {
                    name: "master".into(),
                    revision: app_rev.clone(),
                    is_default: true,
                },
            )
            .with_version(&tool, SourceVersion::from_tag("v1.0.0", tool_rev.clone()))
            .with_file(&app_rev, "vendor/vendor.json", APP_VENDOR)
            .with_file(&tool_rev, "vendor/vendor.json", TOOL_VENDOR)
    }

    #[test]
    fn merges_locks_across_projects() {
        let report =
            govendor_overrides(TEMPLATE, &manager(), &Unused, &Context::default()).unwrap();

        let pins: Vec<_> = report
            .constraints
            .iter()
            .map(|c| (c.name(), c.kind().key(), c.value().as_str()))
            .collect();
        assert_eq!(
            pins,
            [
                ("github.com/pkg/errors", "version", "=v0.8.0"),
                ("github.com/sirupsen/logrus", "branch", "master"),
                (
                    "golang.org/x/net",
                    "revision",
                    "4444444444444444444444444444444444444444"
                ),
            ]
        );

        assert_eq!(report.stripped, 1);
        let excluded: Vec<_> = report
            .notices
            .iter()
            .filter(|n| matches!(n, Notice::Excluded { .. }))
            .collect();
        assert_eq!(excluded.len(), 1);
        let conflicts: Vec<_> = report
            .notices
            .iter()
            .filter_map(|n| match n {
                Notice::Conflict(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].root.as_str(), "golang.org/x/net");
        assert_eq!(conflicts[0].chosen, "golang.org/x/net/http2");
    }

    #[test]
    fn document_reads_back() {
        let report =
            govendor_overrides(TEMPLATE, &manager(), &Unused, &Context::default()).unwrap();
        assert!(!report.document.contains("github.com/old/dep"));
        assert_eq!(parse_overrides(&report.document).unwrap(), report.constraints);
    }

    #[test]
    fn nothing_requested() {
        let template = "[[constraint]]\n  name = \"github.com/acme/app\"\n";
        let report = govendor_overrides(template, &manager(), &Unused, &Context::default()).unwrap();
        assert!(report.constraints.is_empty());
        assert_eq!(report.document, template);
    }

    #[test]
    fn inline_override_array_is_rejected_before_appending() {
        let template = "override = [{ name = \"github.com/x/y\", version = \"=v1.0.0\" }]\n\n\
            [[constraint]]\n  name = \"github.com/acme/app\"\n  [constraint.metadata]\n    govendor-override = true\n";
        let err = govendor_overrides(template, &manager(), &Unused, &Context::default()).unwrap_err();
        assert!(matches!(err, EngineError::Gopkg(GopkgError::Parse { .. })));
    }

    #[test]
    fn abbreviated_lock_revision_fails_without_resolution() {
        let root = ProjectRoot::new("github.com/acme/app").unwrap();
        let rev = Oid::new("c".repeat(40)).unwrap();
        let sm = MockSourceManager::new()
            .with_version(&root, SourceVersion::from_tag("v1.0.0", rev.clone()))
            .with_file(
                &rev,
                "vendor/vendor.json",
                r#"{"package": [{"path": "github.com/pkg/errors", "revision": "abc1234"}]}"#,
            );
        let template = "[[constraint]]\n  name = \"github.com/acme/app\"\n  [constraint.metadata]\n    govendor-override = true\n";
        let err = govendor_overrides(template, &sm, &Unused, &Context::default()).unwrap_err();
        assert!(matches!(err, EngineError::Build(_)));
    }
}
