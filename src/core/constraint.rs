//! core::constraint
//!
//! The normalized pin produced for each dependency.
//!
//! A [`ResolvedConstraint`] names a project and pins it to exactly one of a
//! version, a full revision, or a branch. The choice is a single enum field,
//! so a constraint carrying two pins cannot be built, and the revision arm
//! holds an [`Oid`], so it can never be abbreviated.

use serde::{Deserialize, Serialize};

use super::types::Oid;

/// Which kind of pin a constraint carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintKind {
    /// `version = "..."`
    ExactVersion,
    /// `revision = "..."`
    Revision,
    /// `branch = "..."`
    Branch,
}

impl ConstraintKind {
    /// The Gopkg.toml key this kind is written under.
    pub fn key(self) -> &'static str {
        match self {
            ConstraintKind::ExactVersion => "version",
            ConstraintKind::Revision => "revision",
            ConstraintKind::Branch => "branch",
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The pinned value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintValue {
    /// A version string, `=`-prefixed when it must match exactly.
    Version(String),
    /// A full commit hash.
    Revision(Oid),
    /// A branch name.
    Branch(String),
}

impl ConstraintValue {
    /// The kind of this value.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            ConstraintValue::Version(_) => ConstraintKind::ExactVersion,
            ConstraintValue::Revision(_) => ConstraintKind::Revision,
            ConstraintValue::Branch(_) => ConstraintKind::Branch,
        }
    }

    /// The value as written to the document.
    pub fn as_str(&self) -> &str {
        match self {
            ConstraintValue::Version(v) | ConstraintValue::Branch(v) => v,
            ConstraintValue::Revision(oid) => oid.as_str(),
        }
    }
}

/// A normalized, immutable pin for one project.
///
/// # Example
///
/// ```
/// use gopin::core::constraint::{ConstraintKind, ConstraintValue, ResolvedConstraint};
///
/// let c = ResolvedConstraint::new("example.com/foo", ConstraintValue::Version("=v1.2.3".into()));
/// assert_eq!(c.kind(), ConstraintKind::ExactVersion);
/// assert_eq!(c.value().as_str(), "=v1.2.3");
/// assert!(c.source().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedConstraint {
    name: String,
    value: ConstraintValue,
    source: Option<String>,
}

impl ResolvedConstraint {
    /// Create a constraint for `name`.
    pub fn new(name: impl Into<String>, value: ConstraintValue) -> Self {
        Self {
            name: name.into(),
            value,
            source: None,
        }
    }

    /// Attach an alternate source location.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The project name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kind of pin.
    pub fn kind(&self) -> ConstraintKind {
        self.value.kind()
    }

    /// The pinned value.
    pub fn value(&self) -> &ConstraintValue {
        &self.value
    }

    /// The alternate source location, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ResolvedConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}={}", self.name, self.kind(), self.value.as_str())
    }
}
