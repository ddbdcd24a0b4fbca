//! Integration tests for the override pipelines.
//!
//! The dependency being expanded and the dependency whose pseudo-version
//! needs resolving are both real git repositories; only `go get` is
//! replaced by a fetcher pointing at the local clone.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use gopin::core::constraint::ConstraintKind;
use gopin::core::types::ImportPath;
use gopin::engine::{self, Context, ManifestSource, Notice};
use gopin::gopkg::emit::parse_overrides;
use gopin::resolve::fetch::{FetchError, Fetcher};
use gopin::resolve::ShaResolver;
use gopin::source::GitSourceManager;
use gopin::ui::output::Verbosity;

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "-b", "master"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn commit_file(&self, path: &str, content: &str, message: &str) -> String {
        std::fs::write(self.path().join(path), content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-m", message]);
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");
    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Resolves every import path against one local repository.
struct LocalCheckout(PathBuf);

impl Fetcher for LocalCheckout {
    fn fetch(&self, _import_path: &ImportPath, _root: &Path) -> Result<PathBuf, FetchError> {
        Ok(self.0.clone())
    }
}

struct Fixture {
    app: TestRepo,
    dep_head: String,
    dep: TestRepo,
    cache: TempDir,
}

fn fixture() -> Fixture {
    let dep = TestRepo::new();
    let dep_head = dep.commit_file("bar.go", "package bar\n", "add bar");

    let app = TestRepo::new();
    let go_mod = format!(
        "module github.com/acme/app\n\n\
         go 1.13\n\n\
         require (\n\
         \texample.com/foo v1.2.3+incompatible\n\
         \texample.com/bar v0.0.0-20200101000000-{} // indirect\n\
         )\n",
        &dep_head[..7]
    );
    app.commit_file("go.mod", &go_mod, "add go.mod");
    run_git(app.path(), &["tag", "v1.0.0"]);

    Fixture {
        app,
        dep_head,
        dep,
        cache: TempDir::new().unwrap(),
    }
}

fn template(app: &Path) -> String {
    format!(
        "# Managed by hand.\n\n\
         [[constraint]]\n  name = \"github.com/acme/app\"\n  source = \"{}\"\n  version = \"1.0.0\"\n  \
         [constraint.metadata]\n    gomod-override = true\n",
        app.display()
    )
}

fn quiet() -> Context {
    Context {
        verbosity: Verbosity::Quiet,
        ..Default::default()
    }
}

#[test]
fn gomod_pins_versions_and_resolves_pseudo_versions() {
    let f = fixture();
    let sm = GitSourceManager::new(f.cache.path(), false, Verbosity::Quiet).unwrap();
    let resolver = ShaResolver::new(LocalCheckout(f.dep.path().to_path_buf()));

    let report = engine::gomod_overrides(
        &template(f.app.path()),
        &sm,
        &resolver,
        &ManifestSource::GoMod,
        &quiet(),
    )
    .unwrap();

    let pins: Vec<_> = report
        .constraints
        .iter()
        .map(|c| (c.name().to_string(), c.kind(), c.value().as_str().to_string()))
        .collect();
    assert_eq!(
        pins,
        [
            (
                "example.com/bar".to_string(),
                ConstraintKind::Revision,
                f.dep_head.clone()
            ),
            (
                "example.com/foo".to_string(),
                ConstraintKind::ExactVersion,
                "=v1.2.3".to_string()
            ),
        ]
    );

    assert!(report.document.starts_with("# Managed by hand.\n"));
    assert!(report
        .document
        .contains(&format!("revision = \"{}\"", f.dep_head)));
    assert!(report.document.contains("version = \"=v1.2.3\""));
    assert_eq!(parse_overrides(&report.document).unwrap(), report.constraints);
}

#[test]
fn rerun_replaces_previous_output() {
    let f = fixture();
    let sm = GitSourceManager::new(f.cache.path(), false, Verbosity::Quiet).unwrap();
    let resolver = ShaResolver::new(LocalCheckout(f.dep.path().to_path_buf()));

    let first = engine::gomod_overrides(
        &template(f.app.path()),
        &sm,
        &resolver,
        &ManifestSource::GoMod,
        &quiet(),
    )
    .unwrap();
    let second = engine::gomod_overrides(
        &first.document,
        &sm,
        &resolver,
        &ManifestSource::GoMod,
        &quiet(),
    )
    .unwrap();

    assert_eq!(second.stripped, first.constraints.len());
    assert_eq!(second.constraints, first.constraints);
    assert_eq!(
        parse_overrides(&second.document).unwrap().len(),
        first.constraints.len()
    );
}

#[test]
fn local_replacement_is_reported() {
    let f = fixture();
    f.app.commit_file(
        "go.mod",
        "module github.com/acme/app\n\nrequire example.com/local v1.0.0\n\nreplace example.com/local => ../local\n",
        "local replace",
    );
    run_git(f.app.path(), &["tag", "v1.1.0"]);

    let sm = GitSourceManager::new(f.cache.path(), false, Verbosity::Quiet).unwrap();
    let resolver = ShaResolver::new(LocalCheckout(f.dep.path().to_path_buf()));
    let report = engine::gomod_overrides(
        &template(f.app.path()).replace("version = \"1.0.0\"", "version = \"1.1.0\""),
        &sm,
        &resolver,
        &ManifestSource::GoMod,
        &quiet(),
    )
    .unwrap();

    assert!(report.constraints.is_empty());
    assert!(matches!(
        report.notices.as_slice(),
        [Notice::Skipped(s)] if s.path == "example.com/local"
    ));
}
