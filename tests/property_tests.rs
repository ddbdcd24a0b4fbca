//! Property-based tests for version classification and override emission.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use gopin::core::constraint::{ConstraintValue, ResolvedConstraint};
use gopin::core::types::Oid;
use gopin::core::version::{classify, VersionError, VersionKind};
use gopin::gopkg::emit::{emit, parse_overrides};
use gopin::gopkg::OverrideTool;

/// Strategy for `vMAJOR.MINOR.PATCH` cores.
fn release() -> impl Strategy<Value = String> {
    (0u32..50, 0u32..50, 0u32..50).prop_map(|(a, b, c)| format!("v{}.{}.{}", a, b, c))
}

/// Strategy for hex strings of a given length range.
fn hex(len: std::ops::Range<usize>) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(b"0123456789abcdef".to_vec()), len)
        .prop_map(|bytes| String::from_utf8(bytes).unwrap())
}

/// Strategy for import-path-like project names.
fn project_name() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", "[a-z]{1,8}").prop_map(|(org, repo)| format!("github.com/{}/{}", org, repo))
}

proptest! {
    /// A release, with or without `+incompatible`, pins `=` plus the bare release.
    #[test]
    fn release_pins_exact(v in release(), incompatible in any::<bool>()) {
        let raw = if incompatible { format!("{}+incompatible", v) } else { v.clone() };
        let c = classify("example.com/m", &raw).unwrap();
        prop_assert_eq!(c.kind, VersionKind::Exact(format!("={}", v)));
        prop_assert_eq!(c.incompatible, incompatible);
    }

    /// A two-segment prerelease is kept verbatim.
    #[test]
    fn two_segment_prerelease_verbatim(v in release(), pre in "[a-z][a-z0-9]{0,8}") {
        let raw = format!("{}-{}", v, pre);
        let c = classify("example.com/m", &raw).unwrap();
        prop_assert_eq!(c.kind, VersionKind::Exact(raw));
    }

    /// A pseudo-version with a full hash needs no resolution.
    #[test]
    fn full_hash_is_revision(v in release(), stamp in "[0-9]{14}", h in hex(40..41)) {
        let raw = format!("{}-{}-{}", v, stamp, h);
        let c = classify("example.com/m", &raw).unwrap();
        prop_assert!(!c.needs_resolution());
        prop_assert_eq!(c.kind, VersionKind::Revision(Oid::new(h).unwrap()));
    }

    /// A pseudo-version with an abbreviated hash asks for that exact prefix.
    #[test]
    fn short_hash_needs_resolution(v in release(), stamp in "[0-9]{14}", h in hex(7..40)) {
        let raw = format!("{}-{}-{}", v, stamp, h);
        match classify("example.com/m", &raw).unwrap().kind {
            VersionKind::AbbreviatedRevision(prefix) => prop_assert_eq!(prefix.as_str(), h.as_str()),
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    /// Four or more prerelease segments are always rejected.
    #[test]
    fn too_many_segments_rejected(v in release(), parts in prop::collection::vec("[a-z0-9]{1,6}", 3..6)) {
        let raw = format!("{}-{}", v, parts.join("-"));
        let is_malformed = matches!(
            classify("example.com/m", &raw),
            Err(VersionError::Malformed { .. })
        );
        prop_assert!(is_malformed);
    }

    /// Strings that are not semantic versions are branches.
    #[test]
    fn non_semver_is_branch(name in "[a-z][a-z-]{0,15}") {
        let c = classify("example.com/m", &name).unwrap();
        prop_assert_eq!(c.kind, VersionKind::Branch(name));
    }

    /// Emitted overrides read back with the same kind and value.
    #[test]
    fn emitted_overrides_read_back(
        entries in prop::collection::vec((project_name(), 0u8..3, hex(40..41), "[a-z]{1,10}"), 1..8),
        vendor in any::<bool>(),
    ) {
        let constraints: Vec<_> = entries
            .into_iter()
            .map(|(name, kind, h, word)| {
                let value = match kind {
                    0 => ConstraintValue::Version(format!("={}", word)),
                    1 => ConstraintValue::Revision(Oid::new(h).unwrap()),
                    _ => ConstraintValue::Branch(word),
                };
                ResolvedConstraint::new(name, value)
            })
            .collect();
        let tool = if vendor { OverrideTool::GoVendor } else { OverrideTool::GoMod };

        let back = parse_overrides(&emit(&constraints, tool)).unwrap();
        prop_assert_eq!(back, constraints);
    }
}
