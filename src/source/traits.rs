//! source::traits
//!
//! The source manager seam and the version types it trades in.
//!
//! # Design
//!
//! [`SourceManager`] is the only way the pipelines reach a dependency's
//! repository: deducing which project owns an import path, listing the
//! project's versions, and writing a chosen version's tree to disk. The
//! git-backed implementation and the in-memory mock both sit behind it.
//!
//! Version selection mirrors an upgrade: [`sort_for_upgrade`] puts the most
//! desirable candidates first and [`select_version`] takes the first one the
//! constraint's [`VersionMatcher`] accepts.

use std::cmp::Ordering;
use std::path::Path;

use thiserror::Error;

use crate::core::merge::ProjectCanonicalizer;
use crate::core::types::{ImportPath, Oid, ProjectRoot, TypeError};
use crate::core::version::{parse_go_semver, INCOMPATIBLE_SUFFIX};
use crate::git::GitError;

/// Errors from source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No rule or vanity lookup could place the path in a project.
    #[error("cannot deduce project root for {path}: {reason}")]
    Deduction {
        /// The import path
        path: String,
        /// Why deduction failed
        reason: String,
    },

    /// The vanity import lookup failed.
    #[error("go-get lookup for {path} failed: {message}")]
    Lookup {
        /// The import path
        path: String,
        /// Transport or parse failure
        message: String,
    },

    /// The project exists but has no such version.
    #[error("no version found for {project} with constraint {matcher}")]
    NoMatchingVersion {
        /// The project
        project: String,
        /// Description of the constraint
        matcher: String,
    },

    /// Another process holds the cache.
    #[error("source cache {path} is locked by another process")]
    CacheLocked {
        /// The cache directory
        path: String,
    },

    /// Filesystem failure in the cache or export directory.
    #[error("source cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Repository operation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A value failed validation.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The async runtime could not be created.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// A project and, optionally, an alternate location to fetch it from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectIdentifier {
    /// The project's canonical root
    pub root: ProjectRoot,
    /// Alternate source URL or path
    pub source: Option<String>,
}

impl ProjectIdentifier {
    /// Identify `root` at its default location.
    pub fn new(root: ProjectRoot) -> Self {
        Self { root, source: None }
    }

    /// Fetch from `source` instead.
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source.filter(|s| !s.is_empty());
        self
    }
}

impl std::fmt::Display for ProjectIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} (from {})", self.root, source),
            None => write!(f, "{}", self.root),
        }
    }
}

/// A version a project offers, paired with the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceVersion {
    /// A tag that parses as a semantic version.
    Semver {
        /// Tag name as published
        tag: String,
        /// Parsed version
        version: semver::Version,
        /// Tagged commit
        revision: Oid,
    },
    /// Any other tag.
    Plain {
        /// Tag name
        tag: String,
        /// Tagged commit
        revision: Oid,
    },
    /// A branch head.
    Branch {
        /// Branch name
        name: String,
        /// Head commit
        revision: Oid,
        /// Whether this is the repository's default branch
        is_default: bool,
    },
    /// A bare commit.
    Revision(Oid),
}

impl SourceVersion {
    /// Classify a tag.
    pub fn from_tag(tag: impl Into<String>, revision: Oid) -> Self {
        let tag = tag.into();
        let stripped = tag.strip_suffix(INCOMPATIBLE_SUFFIX).unwrap_or(&tag);
        match parse_go_semver(stripped) {
            Some(version) => SourceVersion::Semver {
                tag,
                version,
                revision,
            },
            None => SourceVersion::Plain { tag, revision },
        }
    }

    /// The commit this version points at.
    pub fn revision(&self) -> &Oid {
        match self {
            SourceVersion::Semver { revision, .. }
            | SourceVersion::Plain { revision, .. }
            | SourceVersion::Branch { revision, .. }
            | SourceVersion::Revision(revision) => revision,
        }
    }

    /// The tag or branch name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            SourceVersion::Semver { tag, .. } | SourceVersion::Plain { tag, .. } => Some(tag),
            SourceVersion::Branch { name, .. } => Some(name),
            SourceVersion::Revision(_) => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SourceVersion::Semver { .. } => 0,
            SourceVersion::Branch { .. } => 1,
            SourceVersion::Plain { .. } => 2,
            SourceVersion::Revision(_) => 3,
        }
    }
}

impl std::fmt::Display for SourceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.revision().short(7)),
            None => write!(f, "{}", self.revision()),
        }
    }
}

/// Order versions for an upgrade.
///
/// Semantic versions come first, newest first, with prereleases after every
/// release. Branches follow (the default branch first, then by name), then
/// other tags by name, then bare revisions.
pub fn sort_for_upgrade(versions: &mut [SourceVersion]) {
    versions.sort_by(upgrade_order);
}

fn upgrade_order(a: &SourceVersion, b: &SourceVersion) -> Ordering {
    use SourceVersion::*;

    a.rank().cmp(&b.rank()).then_with(|| match (a, b) {
        (Semver { version: va, .. }, Semver { version: vb, .. }) => {
            let a_pre = !va.pre.is_empty();
            let b_pre = !vb.pre.is_empty();
            a_pre.cmp(&b_pre).then_with(|| vb.cmp(va))
        }
        (
            Branch {
                name: na,
                is_default: da,
                ..
            },
            Branch {
                name: nb,
                is_default: db,
                ..
            },
        ) => db.cmp(da).then_with(|| na.cmp(nb)),
        (Plain { tag: ta, .. }, Plain { tag: tb, .. }) => ta.cmp(tb),
        _ => a.revision().cmp(b.revision()),
    })
}

/// Which versions a Gopkg.toml constraint accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum VersionMatcher {
    /// A branch by name.
    Branch(String),
    /// A semantic version range.
    Semver(semver::VersionReq),
    /// A tag or branch named exactly this.
    Exact(String),
    /// A commit, by full or abbreviated hash.
    Revision(String),
    /// Anything.
    Any,
}

impl VersionMatcher {
    /// Build a matcher from a constraint's `branch`, `version` and
    /// `revision` fields, checked in that order.
    ///
    /// A `version` that is not a semantic range is matched literally.
    pub fn from_constraint(
        branch: Option<&str>,
        version: Option<&str>,
        revision: Option<&str>,
    ) -> Self {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(branch) = non_empty(branch) {
            return VersionMatcher::Branch(branch.to_string());
        }
        if let Some(version) = non_empty(version) {
            return match parse_range(version) {
                Some(req) => VersionMatcher::Semver(req),
                None => VersionMatcher::Exact(version.to_string()),
            };
        }
        if let Some(revision) = non_empty(revision) {
            return VersionMatcher::Revision(revision.to_ascii_lowercase());
        }
        VersionMatcher::Any
    }

    /// Whether `version` satisfies this matcher.
    pub fn matches(&self, version: &SourceVersion) -> bool {
        match self {
            VersionMatcher::Any => true,
            VersionMatcher::Branch(want) => {
                matches!(version, SourceVersion::Branch { name, .. } if name == want)
            }
            VersionMatcher::Semver(req) => {
                matches!(version, SourceVersion::Semver { version, .. } if req.matches(version))
            }
            VersionMatcher::Exact(want) => version.name() == Some(want.as_str()),
            VersionMatcher::Revision(want) => version.revision().as_str().starts_with(want),
        }
    }
}

impl std::fmt::Display for VersionMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionMatcher::Branch(b) => write!(f, "branch {}", b),
            VersionMatcher::Semver(req) => write!(f, "{}", req),
            VersionMatcher::Exact(v) => write!(f, "{}", v),
            VersionMatcher::Revision(r) => write!(f, "revision {}", r),
            VersionMatcher::Any => write!(f, "*"),
        }
    }
}

/// Parse a Go-flavored semantic range such as `^v1.2.0` or `=v1.2.3`.
///
/// `v` prefixes are dropped from each comparator; a bare version is a caret
/// range.
fn parse_range(text: &str) -> Option<semver::VersionReq> {
    let normalized: Vec<String> = text
        .split(',')
        .map(|part| {
            let part = part.trim();
            let op_len = part
                .find(|c: char| !matches!(c, '=' | '<' | '>' | '~' | '^' | ' '))
                .unwrap_or(part.len());
            let (op, rest) = part.split_at(op_len);
            let rest = rest.strip_prefix('v').unwrap_or(rest);
            format!("{}{}", op.trim(), rest)
        })
        .collect();
    let joined = normalized.join(", ");
    if !joined.starts_with(|c: char| c.is_ascii_digit() || "=<>~^*".contains(c)) {
        return None;
    }
    semver::VersionReq::parse(&joined).ok()
}

/// Pick the most desirable version `matcher` accepts.
///
/// A revision matcher naming a full hash that no listed version points at
/// selects that bare commit.
pub fn select_version(
    mut versions: Vec<SourceVersion>,
    matcher: &VersionMatcher,
) -> Option<SourceVersion> {
    sort_for_upgrade(&mut versions);
    if let Some(found) = versions.into_iter().find(|v| matcher.matches(v)) {
        return Some(found);
    }
    match matcher {
        VersionMatcher::Revision(hash) => Oid::new(hash.as_str()).ok().map(SourceVersion::Revision),
        _ => None,
    }
}

/// Access to dependency repositories.
pub trait SourceManager {
    /// Deduce the project that owns `path`.
    fn deduce_project_root(&self, path: &ImportPath) -> Result<ProjectRoot, SourceError>;

    /// List every version `project` offers.
    fn list_versions(&self, project: &ProjectIdentifier) -> Result<Vec<SourceVersion>, SourceError>;

    /// Write the tree of `version` into `dest`.
    fn export_project(
        &self,
        project: &ProjectIdentifier,
        version: &SourceVersion,
        dest: &Path,
    ) -> Result<(), SourceError>;
}

/// Uses a [`SourceManager`] to place packages in projects when merging locks.
pub struct SourceCanonicalizer<'a, S: ?Sized>(pub &'a S);

impl<S: SourceManager + ?Sized> ProjectCanonicalizer for SourceCanonicalizer<'_, S> {
    type Error = SourceError;

    fn project_root(&self, path: &ImportPath) -> Result<ProjectRoot, SourceError> {
        self.0.deduce_project_root(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> Oid {
        Oid::new(format!("{:040x}", n)).unwrap()
    }

    fn names(versions: &[SourceVersion]) -> Vec<String> {
        versions
            .iter()
            .map(|v| v.name().map(String::from).unwrap_or_else(|| v.revision().to_string()))
            .collect()
    }

    mod ordering {
        use super::*;

        #[test]
        fn upgrade_order() {
            let mut versions = vec![
                SourceVersion::Revision(oid(9)),
                SourceVersion::from_tag("release-x", oid(1)),
                SourceVersion::Branch {
                    name: "feature".into(),
                    revision: oid(2),
                    is_default: false,
                },
                SourceVersion::from_tag("v1.0.0", oid(3)),
                SourceVersion::from_tag("v2.0.0-rc1", oid(4)),
                SourceVersion::Branch {
                    name: "master".into(),
                    revision: oid(5),
                    is_default: true,
                },
                SourceVersion::from_tag("v1.2.0", oid(6)),
            ];
            sort_for_upgrade(&mut versions);
            assert_eq!(
                names(&versions),
                [
                    "v1.2.0".to_string(),
                    "v1.0.0".into(),
                    "v2.0.0-rc1".into(),
                    "master".into(),
                    "feature".into(),
                    "release-x".into(),
                    oid(9).to_string(),
                ]
            );
        }

        #[test]
        fn incompatible_tags_are_semver() {
            assert!(matches!(
                SourceVersion::from_tag("v3.1.0+incompatible", oid(1)),
                SourceVersion::Semver { .. }
            ));
        }
    }

    mod matching {
        use super::*;

        fn versions() -> Vec<SourceVersion> {
            vec![
                SourceVersion::from_tag("v1.0.0", oid(1)),
                SourceVersion::from_tag("v1.4.2", oid(2)),
                SourceVersion::from_tag("v2.0.0", oid(3)),
                SourceVersion::from_tag("nightly", oid(4)),
                SourceVersion::Branch {
                    name: "master".into(),
                    revision: oid(5),
                    is_default: true,
                },
            ]
        }

        #[test]
        fn caret_range_picks_newest_compatible() {
            let m = VersionMatcher::from_constraint(None, Some("^v1.0.0"), None);
            let chosen = select_version(versions(), &m).unwrap();
            assert_eq!(chosen.name(), Some("v1.4.2"));
        }

        #[test]
        fn exact_semver_pin() {
            let m = VersionMatcher::from_constraint(None, Some("=v1.0.0"), None);
            assert_eq!(select_version(versions(), &m).unwrap().name(), Some("v1.0.0"));
        }

        #[test]
        fn non_semver_version_matches_literally() {
            let m = VersionMatcher::from_constraint(None, Some("nightly"), None);
            assert_eq!(m, VersionMatcher::Exact("nightly".into()));
            assert_eq!(select_version(versions(), &m).unwrap().revision(), &oid(4));
        }

        #[test]
        fn branch_takes_precedence() {
            let m = VersionMatcher::from_constraint(Some("master"), Some("^1.0.0"), None);
            assert_eq!(select_version(versions(), &m).unwrap().name(), Some("master"));
        }

        #[test]
        fn revision_prefix_matches_paired_version() {
            let m = VersionMatcher::from_constraint(None, None, Some(&oid(3).as_str()[..39]));
            assert_eq!(select_version(versions(), &m).unwrap().name(), Some("v2.0.0"));
        }

        #[test]
        fn unlisted_full_revision_is_bare() {
            let hash = oid(42).to_string();
            let m = VersionMatcher::from_constraint(None, None, Some(&hash));
            assert_eq!(
                select_version(versions(), &m),
                Some(SourceVersion::Revision(oid(42)))
            );
        }

        #[test]
        fn any_takes_top_of_upgrade_order() {
            let chosen = select_version(versions(), &VersionMatcher::Any).unwrap();
            assert_eq!(chosen.name(), Some("v2.0.0"));
        }

        #[test]
        fn nothing_matches() {
            let m = VersionMatcher::from_constraint(Some("develop"), None, None);
            assert!(select_version(versions(), &m).is_none());
        }
    }
}
