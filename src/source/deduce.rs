//! source::deduce
//!
//! Deducing the project root and repository URL for an import path.
//!
//! Well-known hosts are handled by static rules; every other path goes
//! through a [`VanityLookup`]. Lookup answers are cached per prefix, so all
//! packages of one vanity project cost a single request.

use std::cell::RefCell;

use super::traits::SourceError;
use super::vanity::{GoImport, VanityLookup};
use crate::core::types::{ImportPath, ProjectRoot};

/// Where a project lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduction {
    /// The project root
    pub root: ProjectRoot,
    /// Repository URL to fetch from
    pub url: String,
}

/// Deduce with static rules alone.
///
/// Returns `Ok(None)` when no rule applies and a vanity lookup is needed.
///
/// # Errors
///
/// [`SourceError::Deduction`] when a known host's path is too short to
/// name a repository.
///
/// # Example
///
/// ```
/// use gopin::core::types::ImportPath;
/// use gopin::source::deduce::deduce_static;
///
/// let path = ImportPath::new("github.com/pkg/errors/internal").unwrap();
/// let d = deduce_static(&path).unwrap().unwrap();
/// assert_eq!(d.root.as_str(), "github.com/pkg/errors");
/// assert_eq!(d.url, "https://github.com/pkg/errors");
/// ```
pub fn deduce_static(path: &ImportPath) -> Result<Option<Deduction>, SourceError> {
    let segments: Vec<&str> = path.segments().collect();
    let too_short = |reason: &str| SourceError::Deduction {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let (root_len, url) = match segments.as_slice() {
        ["github.com" | "bitbucket.org", owner, repo, ..] => {
            (3, format!("https://{}/{}/{}", segments[0], owner, repo))
        }
        ["github.com" | "bitbucket.org", ..] => {
            return Err(too_short("expected host/owner/repository"))
        }
        ["gopkg.in", name, ..] if gopkg_version(name).is_some() => {
            let base = gopkg_version(name).unwrap_or(*name);
            (2, format!("https://github.com/go-{}/{}", base, base))
        }
        ["gopkg.in", user, name, ..] if gopkg_version(name).is_some() => {
            let base = gopkg_version(name).unwrap_or(*name);
            (3, format!("https://github.com/{}/{}", user, base))
        }
        ["gopkg.in", ..] => return Err(too_short("expected gopkg.in/[user/]name.vN")),
        ["golang.org", "x", name, ..] => (3, format!("https://go.googlesource.com/{}", name)),
        ["go.googlesource.com", name, ..] => (2, format!("https://go.googlesource.com/{}", name)),
        _ => match segments.iter().skip(1).position(|s| s.ends_with(".git")) {
            Some(index) => {
                let root_len = index + 2;
                (root_len, format!("https://{}", segments[..root_len].join("/")))
            }
            None => return Ok(None),
        },
    };

    let root = ProjectRoot::new(segments[..root_len].join("/"))?;
    Ok(Some(Deduction { root, url }))
}

/// Package name of a gopkg.in `name.vN` segment.
fn gopkg_version(segment: &str) -> Option<&str> {
    let (name, version) = segment.rsplit_once(".v")?;
    let major = version.split('-').next().unwrap_or(version);
    if name.is_empty() || major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(name)
}

/// Deduces roots with static rules, falling back to vanity lookups.
pub struct Deducer<V> {
    vanity: V,
    runtime: tokio::runtime::Runtime,
    cache: RefCell<Vec<Deduction>>,
}

impl<V: VanityLookup> Deducer<V> {
    /// Create a deducer.
    pub fn new(vanity: V) -> Result<Self, SourceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SourceError::Runtime)?;
        Ok(Self {
            vanity,
            runtime,
            cache: RefCell::new(Vec::new()),
        })
    }

    /// Deduce where `path` lives.
    pub fn deduce(&self, path: &ImportPath) -> Result<Deduction, SourceError> {
        if let Some(deduction) = deduce_static(path)? {
            return Ok(deduction);
        }

        if let Some(cached) = self
            .cache
            .borrow()
            .iter()
            .find(|d| d.root.contains(path))
        {
            return Ok(cached.clone());
        }

        let import = self.runtime.block_on(self.vanity.lookup(path))?;
        let deduction = from_go_import(path, import)?;
        self.cache.borrow_mut().push(deduction.clone());
        Ok(deduction)
    }
}

fn from_go_import(path: &ImportPath, import: GoImport) -> Result<Deduction, SourceError> {
    if import.vcs != "git" {
        return Err(SourceError::Deduction {
            path: path.to_string(),
            reason: format!("unsupported version control system {:?}", import.vcs),
        });
    }
    Ok(Deduction {
        root: ProjectRoot::new(import.prefix)?,
        url: import.repo,
    })
}
