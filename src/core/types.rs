//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Oid`] - Full Git object identifier (SHA)
//! - [`RevisionPrefix`] - Abbreviated commit hash awaiting expansion
//! - [`ImportPath`] - Go package import path
//! - [`ProjectRoot`] - Repository-level identifier several import paths fold into
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so a `ResolvedConstraint` can never carry an
//! abbreviated revision.
//!
//! # Examples
//!
//! ```
//! use gopin::core::types::{ImportPath, Oid, RevisionPrefix};
//!
//! let oid = Oid::new("abc1234def4567890abc123def4567890abc1234").unwrap();
//! let prefix = RevisionPrefix::new("abc1234").unwrap();
//! assert!(oid.starts_with(&prefix));
//!
//! assert!(ImportPath::new("github.com/pkg/errors").is_ok());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid revision prefix: {0}")]
    InvalidRevisionPrefix(String),

    #[error("invalid import path: {0}")]
    InvalidImportPath(String),

    #[error("invalid project root: {0}")]
    InvalidProjectRoot(String),
}

/// Length of a full SHA-1 object id in hex characters.
pub const SHA1_HEX_LEN: usize = 40;

/// Length of a full SHA-256 object id in hex characters.
pub const SHA256_HEX_LEN: usize = 64;

/// A full Git object identifier (SHA-1 or SHA-256).
///
/// OIDs are normalized to lowercase for consistency.
///
/// # Example
///
/// ```
/// use gopin::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// The OID is normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a full hex OID.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        Self::validate(&oid)?;
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    ///
    /// Returns the first `len` characters. If `len` exceeds the OID length,
    /// returns the full OID.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    /// Check whether this OID begins with the given abbreviation.
    pub fn starts_with(&self, prefix: &RevisionPrefix) -> bool {
        self.0.starts_with(prefix.as_str())
    }

    fn validate(oid: &str) -> Result<(), TypeError> {
        if oid.len() != SHA1_HEX_LEN && oid.len() != SHA256_HEX_LEN {
            return Err(TypeError::InvalidOid(format!(
                "expected {} or {} hex characters, got {}",
                SHA1_HEX_LEN,
                SHA256_HEX_LEN,
                oid.len()
            )));
        }
        if !is_hex(oid) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An abbreviated commit hash, as embedded in Go pseudo-versions.
///
/// Always non-empty, hexadecimal, lowercase and strictly shorter than a
/// full SHA-256 id.
///
/// # Example
///
/// ```
/// use gopin::core::types::RevisionPrefix;
///
/// let prefix = RevisionPrefix::new("ABC1234").unwrap();
/// assert_eq!(prefix.as_str(), "abc1234");
/// assert!(RevisionPrefix::new("").is_err());
/// assert!(RevisionPrefix::new("xyz").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionPrefix(String);

impl RevisionPrefix {
    /// Create a new validated prefix, normalized to lowercase.
    pub fn new(prefix: impl Into<String>) -> Result<Self, TypeError> {
        let prefix = prefix.into().to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(TypeError::InvalidRevisionPrefix(
                "prefix cannot be empty".into(),
            ));
        }
        if prefix.len() >= SHA256_HEX_LEN {
            return Err(TypeError::InvalidRevisionPrefix(format!(
                "prefix of {} characters is not abbreviated",
                prefix.len()
            )));
        }
        if !is_hex(&prefix) {
            return Err(TypeError::InvalidRevisionPrefix(format!(
                "'{}' is not hexadecimal",
                prefix
            )));
        }
        Ok(Self(prefix))
    }

    /// Get the prefix as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of hex characters in the prefix.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed prefix.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<String> for RevisionPrefix {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RevisionPrefix> for String {
    fn from(prefix: RevisionPrefix) -> Self {
        prefix.0
    }
}

impl std::fmt::Display for RevisionPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Go import path (`github.com/owner/repo/sub/pkg`).
///
/// Import paths must:
/// - Be non-empty
/// - Not start or end with `/`
/// - Not contain empty, `.` or `..` components
/// - Not contain whitespace, backslashes, or a URL scheme
///
/// # Example
///
/// ```
/// use gopin::core::types::ImportPath;
///
/// let path = ImportPath::new("github.com/pkg/errors").unwrap();
/// assert!(path.has_prefix("github.com/pkg"));
/// assert!(ImportPath::new("https://github.com/pkg/errors").is_err());
/// assert!(ImportPath::new("github.com//errors").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImportPath(String);

impl ImportPath {
    /// Create a new validated import path.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        validate_path(&path).map_err(TypeError::InvalidImportPath)?;
        Ok(Self(path))
    }

    /// Get the import path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path components separated by `/`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Plain string-prefix match, as used by exclusion lists.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl TryFrom<String> for ImportPath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ImportPath> for String {
    fn from(path: ImportPath) -> Self {
        path.0
    }
}

impl AsRef<str> for ImportPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImportPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The canonical, repository-level identifier for a project.
///
/// Ordering is lexicographic on the string form; emitted overrides are
/// sorted by it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectRoot(String);

impl ProjectRoot {
    /// Create a new validated project root.
    pub fn new(root: impl Into<String>) -> Result<Self, TypeError> {
        let root = root.into();
        validate_path(&root).map_err(TypeError::InvalidProjectRoot)?;
        Ok(Self(root))
    }

    /// Get the project root as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether `path` lies inside this project.
    ///
    /// ```
    /// use gopin::core::types::{ImportPath, ProjectRoot};
    ///
    /// let root = ProjectRoot::new("github.com/a/b").unwrap();
    /// assert!(root.contains(&ImportPath::new("github.com/a/b/c").unwrap()));
    /// assert!(!root.contains(&ImportPath::new("github.com/a/bc").unwrap()));
    /// ```
    pub fn contains(&self, path: &ImportPath) -> bool {
        let path = path.as_str();
        path == self.0
            || (path.starts_with(&self.0) && path.as_bytes().get(self.0.len()) == Some(&b'/'))
    }
}

impl TryFrom<String> for ProjectRoot {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ProjectRoot> for String {
    fn from(root: ProjectRoot) -> Self {
        root.0
    }
}

impl AsRef<str> for ProjectRoot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Shared validation for slash-separated Go paths.
fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path cannot be empty".into());
    }
    if path.contains("://") {
        return Err(format!("'{}' contains a URL scheme", path));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(format!("'{}' cannot start or end with '/'", path));
    }
    if path
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '\\')
    {
        return Err(format!("'{}' contains invalid characters", path));
    }
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(format!("'{}' has an invalid component", path));
        }
    }
    Ok(())
}
