//! core::lock
//!
//! Package-level locks as recorded by govendor.
//!
//! govendor locks packages, not projects, and permits different locks for
//! packages within the same repository. [`crate::core::merge`] folds them
//! onto project roots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One package entry of `vendor/vendor.json`.
///
/// Keys are accepted in govendor's camelCase and in Go's capitalized field
/// form. An empty `revisionTime` is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageLock {
    /// Package import path.
    #[serde(alias = "Path")]
    pub path: String,

    /// Requested version (tag, branch, or empty).
    #[serde(default, alias = "Version")]
    pub version: String,

    /// The exact tag the version resolved to.
    #[serde(default, alias = "VersionExact")]
    pub version_exact: String,

    /// Locked commit.
    #[serde(default, alias = "Revision")]
    pub revision: String,

    /// Commit time of `revision`.
    #[serde(
        default,
        alias = "RevisionTime",
        deserialize_with = "deserialize_revision_time"
    )]
    pub revision_time: Option<DateTime<Utc>>,
}

impl PackageLock {
    /// Whether two locks pin the same thing.
    pub fn same_pin(&self, other: &PackageLock) -> bool {
        self.version == other.version && self.revision == other.revision
    }

    /// Human-readable `path@version` or `path@revision` form.
    pub fn describe(&self) -> String {
        format!("{}@{}{}", self.path, self.version, self.revision)
    }
}

fn deserialize_revision_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}
