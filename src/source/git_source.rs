//! source::git_source
//!
//! A [`SourceManager`] backed by bare clones in an on-disk cache.
//!
//! # Cache layout
//!
//! ```text
//! <cache_dir>/
//!   sm.lock                       exclusive lock held while a manager lives
//!   sources/<sha256(url) in hex>/ bare repository for one remote URL
//! ```
//!
//! Each URL is fetched at most once per manager. Deleting the cache only
//! costs the next run its clones.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use sha2::{Digest, Sha256};

use super::deduce::Deducer;
use super::traits::{ProjectIdentifier, SourceError, SourceManager, SourceVersion};
use super::vanity::{HttpVanityLookup, VanityLookup};
use crate::core::types::{ImportPath, ProjectRoot};
use crate::git::{Git, RemoteOptions};
use crate::ui::output::{self, Verbosity};

const LOCK_FILE: &str = "sm.lock";
const REFSPECS: &[&str] = &["+refs/heads/*:refs/heads/*", "+refs/tags/*:refs/tags/*"];

/// Source manager using git2 clones.
pub struct GitSourceManager<V = HttpVanityLookup> {
    cache_dir: PathBuf,
    deducer: Deducer<V>,
    remote: RemoteOptions,
    fetched: RefCell<HashSet<String>>,
    verbosity: Verbosity,
    _lock: File,
}

impl GitSourceManager<HttpVanityLookup> {
    /// Open the cache at `cache_dir` with HTTP vanity lookups.
    ///
    /// # Errors
    ///
    /// [`SourceError::CacheLocked`] if another process holds the cache.
    pub fn new(
        cache_dir: &Path,
        allow_insecure: bool,
        verbosity: Verbosity,
    ) -> Result<Self, SourceError> {
        Self::with_lookup(
            cache_dir,
            HttpVanityLookup::new(allow_insecure),
            RemoteOptions { allow_insecure },
            verbosity,
        )
    }
}

impl<V: VanityLookup> GitSourceManager<V> {
    /// Open the cache at `cache_dir` with a custom vanity lookup.
    pub fn with_lookup(
        cache_dir: &Path,
        vanity: V,
        remote: RemoteOptions,
        verbosity: Verbosity,
    ) -> Result<Self, SourceError> {
        fs::create_dir_all(cache_dir.join("sources"))?;

        let lock = File::create(cache_dir.join(LOCK_FILE))?;
        lock.try_lock_exclusive()
            .map_err(|_| SourceError::CacheLocked {
                path: cache_dir.display().to_string(),
            })?;

        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
            deducer: Deducer::new(vanity)?,
            remote,
            fetched: RefCell::new(HashSet::new()),
            verbosity,
            _lock: lock,
        })
    }

    /// The URL `project` is fetched from.
    pub fn source_url(&self, project: &ProjectIdentifier) -> Result<String, SourceError> {
        match &project.source {
            Some(source) if source.contains("://") || Path::new(source).is_absolute() => {
                Ok(source.clone())
            }
            Some(source) => Ok(format!("https://{}", source)),
            None => {
                let path = ImportPath::new(project.root.as_str())?;
                Ok(self.deducer.deduce(&path)?.url)
            }
        }
    }

    /// Directory of the bare clone for `url`.
    pub fn repo_dir(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.cache_dir.join("sources").join(hex::encode(digest))
    }

    /// Open the clone for `project`, fetching it on first use.
    fn repo(&self, project: &ProjectIdentifier) -> Result<Git, SourceError> {
        let url = self.source_url(project)?;
        let dir = self.repo_dir(&url);
        let git = Git::open_or_init_bare(&dir)?;

        if self.fetched.borrow().contains(&url) {
            return Ok(git);
        }

        output::info(format!("fetching {} from {}", project.root, url), self.verbosity);
        output::debug(format!("cache directory {}", git.git_dir().display()), self.verbosity);
        if let Some(branch) = git.fetch(&url, REFSPECS, self.remote)? {
            git.set_head_branch(&branch)?;
        }
        self.fetched.borrow_mut().insert(url);
        Ok(git)
    }
}

impl<V: VanityLookup> SourceManager for GitSourceManager<V> {
    fn deduce_project_root(&self, path: &ImportPath) -> Result<ProjectRoot, SourceError> {
        Ok(self.deducer.deduce(path)?.root)
    }

    fn list_versions(&self, project: &ProjectIdentifier) -> Result<Vec<SourceVersion>, SourceError> {
        let git = self.repo(project)?;
        let default_branch = git.head_branch()?;

        let mut versions = Vec::new();
        for tag in git.list_refs_by_prefix("refs/tags/")? {
            let name = tag.name.strip_prefix("refs/tags/").unwrap_or(&tag.name);
            versions.push(SourceVersion::from_tag(name, tag.oid));
        }
        for head in git.list_refs_by_prefix("refs/heads/")? {
            let name = head
                .name
                .strip_prefix("refs/heads/")
                .unwrap_or(&head.name)
                .to_string();
            let is_default = default_branch.as_deref() == Some(name.as_str());
            versions.push(SourceVersion::Branch {
                name,
                revision: head.oid,
                is_default,
            });
        }

        Ok(versions)
    }

    fn export_project(
        &self,
        project: &ProjectIdentifier,
        version: &SourceVersion,
        dest: &Path,
    ) -> Result<(), SourceError> {
        let git = self.repo(project)?;
        output::debug(
            format!("exporting {}@{} to {}", project.root, version, dest.display()),
            self.verbosity,
        );
        git.export_tree(version.revision(), dest)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_manager_on_same_cache_is_refused() {
        let temp = TempDir::new().unwrap();
        let _first = GitSourceManager::new(temp.path(), false, Verbosity::Quiet).unwrap();
        let second = GitSourceManager::new(temp.path(), false, Verbosity::Quiet);
        assert!(matches!(second, Err(SourceError::CacheLocked { .. })));
    }

    #[test]
    fn cache_released_on_drop() {
        let temp = TempDir::new().unwrap();
        drop(GitSourceManager::new(temp.path(), false, Verbosity::Quiet).unwrap());
        assert!(GitSourceManager::new(temp.path(), false, Verbosity::Quiet).is_ok());
    }

    #[test]
    fn repo_dir_is_keyed_by_url() {
        let temp = TempDir::new().unwrap();
        let sm = GitSourceManager::new(temp.path(), false, Verbosity::Quiet).unwrap();
        let a = sm.repo_dir("https://github.com/a/b");
        let b = sm.repo_dir("https://github.com/a/c");
        assert_ne!(a, b);
        assert!(a.starts_with(temp.path().join("sources")));
        assert_eq!(a.file_name().unwrap().len(), 64);
    }

    #[test]
    fn source_urls() {
        let temp = TempDir::new().unwrap();
        let sm = GitSourceManager::new(temp.path(), false, Verbosity::Quiet).unwrap();
        let root = ProjectRoot::new("github.com/a/b").unwrap();

        let plain = ProjectIdentifier::new(root.clone());
        assert_eq!(sm.source_url(&plain).unwrap(), "https://github.com/a/b");

        let mirrored =
            ProjectIdentifier::new(root.clone()).with_source(Some("mirror.example/a/b".into()));
        assert_eq!(sm.source_url(&mirrored).unwrap(), "https://mirror.example/a/b");

        let explicit =
            ProjectIdentifier::new(root).with_source(Some("ssh://git@mirror.example/a/b".into()));
        assert_eq!(
            sm.source_url(&explicit).unwrap(),
            "ssh://git@mirror.example/a/b"
        );
    }
}
