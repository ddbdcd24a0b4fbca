//! source::mock
//!
//! In-memory source manager for deterministic testing.
//!
//! # Design
//!
//! Projects, their versions and the files each revision contains are
//! registered up front. Import paths are placed in the registered project
//! that contains them, falling back to the static host rules. Every call is
//! recorded for verification.
//!
//! # Example
//!
//! ```
//! use gopin::core::types::{Oid, ProjectRoot};
//! use gopin::source::mock::MockSourceManager;
//! use gopin::source::{ProjectIdentifier, SourceManager, SourceVersion};
//!
//! let root = ProjectRoot::new("github.com/acme/app").unwrap();
//! let rev = Oid::new("1".repeat(40)).unwrap();
//! let sm = MockSourceManager::new()
//!     .with_version(&root, SourceVersion::from_tag("v1.0.0", rev.clone()))
//!     .with_file(&rev, "go.mod", "module github.com/acme/app\n");
//!
//! let versions = sm.list_versions(&ProjectIdentifier::new(root)).unwrap();
//! assert_eq!(versions.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::deduce::deduce_static;
use super::traits::{ProjectIdentifier, SourceError, SourceManager, SourceVersion};
use crate::core::types::{ImportPath, Oid, ProjectRoot};

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Deduce { path: String },
    ListVersions { root: String },
    Export { root: String, revision: Oid },
}

#[derive(Debug, Default)]
struct MockSourceInner {
    versions: BTreeMap<ProjectRoot, Vec<SourceVersion>>,
    files: HashMap<Oid, BTreeMap<String, String>>,
    operations: Vec<MockOperation>,
}

/// Mock source manager.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockSourceManager {
    inner: Arc<Mutex<MockSourceInner>>,
}

impl MockSourceManager {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project with no versions.
    pub fn with_project(self, root: &ProjectRoot) -> Self {
        self.inner
            .lock()
            .unwrap()
            .versions
            .entry(root.clone())
            .or_default();
        self
    }

    /// Add a version to a project, registering it if needed.
    pub fn with_version(self, root: &ProjectRoot, version: SourceVersion) -> Self {
        self.inner
            .lock()
            .unwrap()
            .versions
            .entry(root.clone())
            .or_default()
            .push(version);
        self
    }

    /// Put a file into the tree of `revision`.
    pub fn with_file(self, revision: &Oid, path: &str, contents: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .files
            .entry(revision.clone())
            .or_default()
            .insert(path.to_string(), contents.to_string());
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    fn record(&self, operation: MockOperation) {
        self.inner.lock().unwrap().operations.push(operation);
    }
}

impl SourceManager for MockSourceManager {
    fn deduce_project_root(&self, path: &ImportPath) -> Result<ProjectRoot, SourceError> {
        self.record(MockOperation::Deduce {
            path: path.to_string(),
        });

        let registered = self
            .inner
            .lock()
            .unwrap()
            .versions
            .keys()
            .filter(|root| root.contains(path))
            .max_by_key(|root| root.as_str().len())
            .cloned();
        if let Some(root) = registered {
            return Ok(root);
        }

        match deduce_static(path)? {
            Some(deduction) => Ok(deduction.root),
            None => Err(SourceError::Deduction {
                path: path.to_string(),
                reason: "no registered project contains it".to_string(),
            }),
        }
    }

    fn list_versions(&self, project: &ProjectIdentifier) -> Result<Vec<SourceVersion>, SourceError> {
        self.record(MockOperation::ListVersions {
            root: project.root.to_string(),
        });

        self.inner
            .lock()
            .unwrap()
            .versions
            .get(&project.root)
            .cloned()
            .ok_or_else(|| SourceError::Deduction {
                path: project.root.to_string(),
                reason: "unknown project".to_string(),
            })
    }

    fn export_project(
        &self,
        project: &ProjectIdentifier,
        version: &SourceVersion,
        dest: &Path,
    ) -> Result<(), SourceError> {
        self.record(MockOperation::Export {
            root: project.root.to_string(),
            revision: version.revision().clone(),
        });

        let files = self
            .inner
            .lock()
            .unwrap()
            .files
            .get(version.revision())
            .cloned()
            .unwrap_or_default();

        std::fs::create_dir_all(dest)?;
        for (relative, contents) in files {
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(target, contents)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rev(c: char) -> Oid {
        Oid::new(c.to_string().repeat(40)).unwrap()
    }

    #[test]
    fn registered_projects_win_over_static_rules() {
        let root = ProjectRoot::new("example.org/tools").unwrap();
        let sm = MockSourceManager::new().with_project(&root);
        let path = ImportPath::new("example.org/tools/cmd").unwrap();
        assert_eq!(sm.deduce_project_root(&path).unwrap(), root);

        let gh = ImportPath::new("github.com/a/b/c").unwrap();
        assert_eq!(sm.deduce_project_root(&gh).unwrap().as_str(), "github.com/a/b");
    }

    #[test]
    fn unknown_vanity_path_fails() {
        let sm = MockSourceManager::new();
        let path = ImportPath::new("example.org/other").unwrap();
        assert!(sm.deduce_project_root(&path).is_err());
    }

    #[test]
    fn export_writes_files_and_records() {
        let root = ProjectRoot::new("github.com/a/b").unwrap();
        let version = SourceVersion::from_tag("v1.0.0", rev('a'));
        let sm = MockSourceManager::new()
            .with_version(&root, version.clone())
            .with_file(&rev('a'), "vendor/vendor.json", "{}");

        let temp = TempDir::new().unwrap();
        let project = ProjectIdentifier::new(root);
        sm.export_project(&project, &version, temp.path()).unwrap();

        assert_eq!(
            std::fs::read_to_string(temp.path().join("vendor/vendor.json")).unwrap(),
            "{}"
        );
        assert_eq!(
            sm.operations(),
            vec![MockOperation::Export {
                root: "github.com/a/b".into(),
                revision: rev('a'),
            }]
        );
    }
}
