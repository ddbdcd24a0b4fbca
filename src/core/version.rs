//! core::version
//!
//! Classification of raw version strings.
//!
//! # Grammar
//!
//! A version string found in a manifest is one of:
//!
//! - a plain semantic version (`v1.2.3`, `v1.2`, `v1`), pinned exactly as
//!   `=v1.2.3`;
//! - a prerelease tag (`v1.0.0-rc1`), kept verbatim;
//! - a pseudo-version (`v0.0.0-20200101000000-abc1234`) whose last prerelease
//!   segment references a commit, possibly abbreviated;
//! - anything else, which is taken to be a branch name.
//!
//! Any of the semantic forms may carry a `+incompatible` suffix. The target
//! format has no equivalent marker, so it is recorded and dropped.
//!
//! # Segment counting
//!
//! The prerelease is counted the way Go's `semver.Prerelease` reports it,
//! with its leading `-`. `-rc1` has two segments, `-20200101000000-abc1234`
//! has three, and any other count is malformed.

use thiserror::Error;

use super::types::{Oid, RevisionPrefix, SHA1_HEX_LEN, SHA256_HEX_LEN};

/// Suffix Go appends to major versions >= 2 that predate modules.
pub const INCOMPATIBLE_SUFFIX: &str = "+incompatible";

/// Shortest hex run treated as a commit reference (git's default abbreviation).
pub const MIN_ABBREV_LEN: usize = 7;

/// Errors from version classification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    /// The prerelease does not follow any known pseudo-version layout.
    #[error("unexpected prerelease format for {path}: {prerelease:?} (in {version:?})")]
    Malformed {
        /// Import path of the offending entry
        path: String,
        /// The version string as found
        version: String,
        /// The prerelease component, with its leading `-`
        prerelease: String,
    },

    /// The version string is empty.
    #[error("empty version for {path}")]
    Empty {
        /// Import path of the offending entry
        path: String,
    },
}

/// What a version string pins to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionKind {
    /// Pin to this exact version string (already `=`-prefixed when needed).
    Exact(String),
    /// Pin to a full commit hash.
    Revision(Oid),
    /// Pin to a commit whose hash must first be expanded.
    AbbreviatedRevision(RevisionPrefix),
    /// Track a branch.
    Branch(String),
}

/// Result of classifying a version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// What the string pins to.
    pub kind: VersionKind,
    /// Whether a `+incompatible` suffix was stripped.
    pub incompatible: bool,
}

impl Classified {
    /// Whether the classification still needs a history lookup.
    pub fn needs_resolution(&self) -> bool {
        matches!(self.kind, VersionKind::AbbreviatedRevision(_))
    }
}

/// Classify `raw`, the version recorded for `path`.
///
/// # Errors
///
/// [`VersionError::Malformed`] when the prerelease has neither two nor three
/// segments, or names a commit with an impossible hash length.
///
/// # Example
///
/// ```
/// use gopin::core::version::{classify, VersionKind};
///
/// let c = classify("example.com/foo", "v1.2.3+incompatible").unwrap();
/// assert_eq!(c.kind, VersionKind::Exact("=v1.2.3".into()));
/// assert!(c.incompatible);
///
/// let c = classify("example.com/bar", "v0.0.0-20200101000000-abc1234").unwrap();
/// assert!(c.needs_resolution());
/// ```
pub fn classify(path: &str, raw: &str) -> Result<Classified, VersionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(VersionError::Empty {
            path: path.to_string(),
        });
    }

    let (stripped, incompatible) = match trimmed.strip_suffix(INCOMPATIBLE_SUFFIX) {
        Some(rest) => (rest, true),
        None => (trimmed, false),
    };

    let Some(version) = parse_go_semver(stripped) else {
        return Ok(Classified {
            kind: VersionKind::Branch(stripped.to_string()),
            incompatible,
        });
    };

    if version.pre.is_empty() {
        return Ok(Classified {
            kind: VersionKind::Exact(format!("={}", stripped)),
            incompatible,
        });
    }

    let prerelease = format!("-{}", version.pre.as_str());
    let segments: Vec<&str> = prerelease.split('-').collect();
    let kind = match segments.as_slice() {
        [_, _] => VersionKind::Exact(stripped.to_string()),
        [_, _, candidate] => commit_reference(path, stripped, &prerelease, candidate)?,
        _ => {
            return Err(VersionError::Malformed {
                path: path.to_string(),
                version: raw.to_string(),
                prerelease,
            })
        }
    };

    Ok(Classified { kind, incompatible })
}

/// Interpret the last segment of a three-segment prerelease.
fn commit_reference(
    path: &str,
    stripped: &str,
    prerelease: &str,
    candidate: &str,
) -> Result<VersionKind, VersionError> {
    // Opaque tags such as `v1.0.0-beta-final` carry no commit.
    if candidate.len() < MIN_ABBREV_LEN || !candidate.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(VersionKind::Exact(stripped.to_string()));
    }

    let malformed = || VersionError::Malformed {
        path: path.to_string(),
        version: stripped.to_string(),
        prerelease: prerelease.to_string(),
    };

    match candidate.len() {
        SHA1_HEX_LEN | SHA256_HEX_LEN => Oid::new(candidate)
            .map(VersionKind::Revision)
            .map_err(|_| malformed()),
        n if n < SHA1_HEX_LEN => RevisionPrefix::new(candidate)
            .map(VersionKind::AbbreviatedRevision)
            .map_err(|_| malformed()),
        _ => Err(malformed()),
    }
}

/// Parse a Go-style semantic version.
///
/// Accepts an optional leading `v` and the `vMAJOR` / `vMAJOR.MINOR`
/// shorthands Go allows (without prerelease or build suffixes).
///
/// ```
/// use gopin::core::version::parse_go_semver;
///
/// assert_eq!(parse_go_semver("v1.2").unwrap().to_string(), "1.2.0");
/// assert!(parse_go_semver("v1.2-rc1").is_none());
/// assert!(parse_go_semver("master").is_none());
/// ```
pub fn parse_go_semver(s: &str) -> Option<semver::Version> {
    let body = s.strip_prefix('v').unwrap_or(s);
    if !body.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let split = body.find(['-', '+']).unwrap_or(body.len());
    let (core, rest) = body.split_at(split);
    let normalized = match core.split('.').count() {
        1 if rest.is_empty() => format!("{}.0.0", core),
        2 if rest.is_empty() => format!("{}.0", core),
        3 => body.to_string(),
        _ => return None,
    };

    semver::Version::parse(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(v: &str) -> VersionKind {
        classify("example.com/p", v).unwrap().kind
    }

    #[test]
    fn plain_version_is_pinned_exactly() {
        assert_eq!(kind("v1.2.3"), VersionKind::Exact("=v1.2.3".into()));
    }

    #[test]
    fn incompatible_suffix_is_stripped() {
        let c = classify("example.com/foo", "v2.0.0+incompatible").unwrap();
        assert_eq!(c.kind, VersionKind::Exact("=v2.0.0".into()));
        assert!(c.incompatible);
    }

    #[test]
    fn shorthand_versions_are_exact() {
        assert_eq!(kind("v1"), VersionKind::Exact("=v1".into()));
        assert_eq!(kind("v1.4"), VersionKind::Exact("=v1.4".into()));
    }

    #[test]
    fn single_segment_prerelease_is_verbatim() {
        assert_eq!(kind("v1.0.0-rc1"), VersionKind::Exact("v1.0.0-rc1".into()));
        assert_eq!(
            kind("v1.0.0-beta.2+incompatible"),
            VersionKind::Exact("v1.0.0-beta.2".into())
        );
    }

    #[test]
    fn pseudo_version_with_short_hash_needs_resolution() {
        let c = classify("example.com/bar", "v0.0.0-20200101000000-abc1234").unwrap();
        assert_eq!(
            c.kind,
            VersionKind::AbbreviatedRevision(RevisionPrefix::new("abc1234").unwrap())
        );
        assert!(c.needs_resolution());
    }

    #[test]
    fn pseudo_version_after_prerelease_base() {
        assert_eq!(
            kind("v1.2.4-0.20191109021931-daa7c04131f5"),
            VersionKind::AbbreviatedRevision(RevisionPrefix::new("daa7c04131f5").unwrap())
        );
    }

    #[test]
    fn pseudo_version_with_full_hash_is_a_revision() {
        let sha = "0123456789abcdef0123456789abcdef01234567";
        let c = classify("example.com/bar", &format!("v0.0.0-20200101000000-{sha}")).unwrap();
        assert_eq!(c.kind, VersionKind::Revision(Oid::new(sha).unwrap()));
        assert!(!c.needs_resolution());
    }

    #[test]
    fn incompatible_pseudo_version() {
        let c = classify("example.com/bar", "v2.0.0-20180101000000-abcdef012345+incompatible")
            .unwrap();
        assert!(c.incompatible);
        assert!(c.needs_resolution());
    }

    #[test]
    fn non_hex_third_segment_is_an_opaque_tag() {
        assert_eq!(
            kind("v1.0.0-beta-final"),
            VersionKind::Exact("v1.0.0-beta-final".into())
        );
        assert_eq!(kind("v1.0.0-beta-2"), VersionKind::Exact("v1.0.0-beta-2".into()));
    }

    #[test]
    fn hex_third_segment_below_abbreviation_length_is_exact() {
        let c = classify("example.com/bar", "v0.0.0-20200101000000-abc12").unwrap();
        assert_eq!(c.kind, VersionKind::Exact("v0.0.0-20200101000000-abc12".into()));
        assert!(!c.needs_resolution());

        assert_eq!(
            kind("v0.0.0-20200101000000-abc1234"),
            VersionKind::AbbreviatedRevision(RevisionPrefix::new("abc1234").unwrap())
        );
    }

    #[test]
    fn too_many_segments_is_malformed() {
        let err = classify("example.com/baz", "v1.0.0-a-b-c").unwrap_err();
        match err {
            VersionError::Malformed { path, prerelease, .. } => {
                assert_eq!(path, "example.com/baz");
                assert_eq!(prerelease, "-a-b-c");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn impossible_hash_length_is_malformed() {
        let hash = "a".repeat(50);
        assert!(matches!(
            classify("example.com/baz", &format!("v0.0.0-20200101000000-{hash}")),
            Err(VersionError::Malformed { .. })
        ));
    }

    #[test]
    fn branch_names() {
        assert_eq!(kind("master"), VersionKind::Branch("master".into()));
        assert_eq!(
            kind("release-branch.go1.9"),
            VersionKind::Branch("release-branch.go1.9".into())
        );
    }

    #[test]
    fn empty_is_an_error() {
        assert_eq!(
            classify("example.com/p", "  "),
            Err(VersionError::Empty {
                path: "example.com/p".into()
            })
        );
    }

    #[test]
    fn go_semver_parsing() {
        assert_eq!(parse_go_semver("1.2.3").unwrap().to_string(), "1.2.3");
        assert_eq!(parse_go_semver("v2").unwrap().to_string(), "2.0.0");
        assert!(parse_go_semver("v1.2.3.4").is_none());
        assert!(parse_go_semver("v01.2.3").is_none());
        assert!(parse_go_semver("vv1").is_none());
    }
}
