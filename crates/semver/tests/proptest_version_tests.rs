//! Property-based tests for version ordering and range parsing.
//!
//! These tests verify the behavioral contracts of the version layer:
//! - Version precedence is a total order and ignores build metadata
//! - Parsing and formatting round-trip
//! - Derived bounds agree with the matching predicate

use proptest::prelude::*;
use std::cmp::Ordering;
use webmod_semver::{AdvancedComparator, PartialVersion, Range, Version};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Generate a single canonical pre-release identifier.
///
/// Alphanumeric identifiers start with a letter so they never collide with
/// the numeric form, and numeric identifiers carry no leading zeros.
fn identifier_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u64..1000).prop_map(|n| n.to_string()),
        "[a-zA-Z][a-zA-Z0-9-]{0,8}".prop_map(String::from),
    ]
}

/// Generate a canonical pre-release tag.
fn pre_release_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(identifier_strategy(), 1..4).prop_map(|ids| ids.join("."))
}

/// Generate a canonical build metadata string.
fn build_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9-]{0,8}".prop_map(String::from)
}

/// Generate a canonical version string (no `v`/`=` prefix, no wildcards).
fn version_string_strategy() -> impl Strategy<Value = String> {
    (
        0u32..100,
        0u32..100,
        0u32..100,
        proptest::option::of(pre_release_strategy()),
        proptest::option::of(build_strategy()),
    )
        .prop_map(|(major, minor, micro, pre, build)| {
            let mut s = format!("{major}.{minor}.{micro}");
            if let Some(pre) = pre {
                s.push('-');
                s.push_str(&pre);
            }
            if let Some(build) = build {
                s.push('+');
                s.push_str(&build);
            }
            s
        })
}

/// Generate a parsed version.
fn version_strategy() -> impl Strategy<Value = Version> {
    version_string_strategy().prop_map(|s| s.parse().expect("strategy emits valid versions"))
}

/// Generate a partial version with at least the major component.
fn bounded_partial_strategy() -> impl Strategy<Value = String> {
    (
        0u32..50,
        proptest::option::of((0u32..50, proptest::option::of(0u32..50))),
    )
        .prop_map(|(major, rest)| match rest {
            None => format!("{major}"),
            Some((minor, None)) => format!("{major}.{minor}"),
            Some((minor, Some(micro))) => format!("{major}.{minor}.{micro}"),
        })
}

/// Generate a single range token that is guaranteed to parse.
fn token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        bounded_partial_strategy(),
        bounded_partial_strategy().prop_map(|p| format!("~{p}")),
        bounded_partial_strategy().prop_map(|p| format!("^{p}")),
        bounded_partial_strategy().prop_map(|p| format!(">={p}")),
        bounded_partial_strategy().prop_map(|p| format!(">{p}")),
        bounded_partial_strategy().prop_map(|p| format!("<={p}")),
        bounded_partial_strategy().prop_map(|p| format!("<{p}")),
        bounded_partial_strategy().prop_map(|p| format!("={p}")),
        Just("*".to_string()),
    ]
}

/// Generate a range expression from valid tokens.
fn range_string_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        proptest::collection::vec(token_strategy(), 1..3).prop_map(|tokens| tokens.join(" ")),
        1..3,
    )
    .prop_map(|clauses| clauses.join(" || "))
}

// =============================================================================
// Property Tests: Ordering
// =============================================================================

proptest! {
    /// Contract: comparison is antisymmetric.
    #[test]
    fn ordering_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }

    /// Contract: comparison is transitive.
    #[test]
    fn ordering_is_transitive(
        a in version_strategy(),
        b in version_strategy(),
        c in version_strategy(),
    ) {
        let mut sorted = vec![a, b, c];
        sorted.sort();
        prop_assert!(sorted[0] <= sorted[1]);
        prop_assert!(sorted[1] <= sorted[2]);
        prop_assert!(sorted[0] <= sorted[2]);
    }

    /// Contract: equality agrees with comparison.
    #[test]
    fn equality_agrees_with_ordering(a in version_strategy(), b in version_strategy()) {
        prop_assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);
    }

    /// Contract: build metadata never affects ordering or equality.
    #[test]
    fn build_metadata_is_ignored(
        a in version_strategy(),
        build in build_strategy(),
    ) {
        let with_build = a.clone().with_build_metadata(build);
        prop_assert_eq!(&a, &with_build);
        prop_assert_eq!(a.cmp(&with_build), Ordering::Equal);
    }

    /// Contract: a release outranks every pre-release of its triple.
    #[test]
    fn release_outranks_pre_release(
        major in 0u32..100,
        minor in 0u32..100,
        micro in 0u32..100,
        pre in pre_release_strategy(),
    ) {
        let release = Version::new(major, minor, micro);
        let pre_release: Version = format!("{major}.{minor}.{micro}-{pre}")
            .parse()
            .expect("strategy emits valid versions");
        prop_assert!(pre_release < release);
    }
}

// =============================================================================
// Property Tests: Round-trip
// =============================================================================

proptest! {
    /// Contract: parsing a canonical version string and formatting it back
    /// is the identity.
    #[test]
    fn version_round_trip(s in version_string_strategy()) {
        let parsed: Version = s.parse().expect("strategy emits valid versions");
        prop_assert_eq!(parsed.to_string(), s);
    }

    /// Contract: the tolerated `v` and `=` prefixes parse to the same value.
    #[test]
    fn prefixes_are_normalized(s in version_string_strategy()) {
        let plain: Version = s.parse().expect("valid");
        let with_v: Version = format!("v{s}").parse().expect("valid with v");
        let with_eq: Version = format!("={s}").parse().expect("valid with =");
        prop_assert_eq!(&plain, &with_v);
        prop_assert_eq!(&plain, &with_eq);
    }

    /// Contract: formatting a parsed range and reparsing it yields the
    /// same range.
    #[test]
    fn range_display_reparses(s in range_string_strategy()) {
        let range: Range = s.parse().expect("strategy emits valid ranges");
        let reparsed: Range = range.to_string().parse().expect("display reparses");
        prop_assert_eq!(range, reparsed);
    }
}

// =============================================================================
// Property Tests: Bounds
// =============================================================================

proptest! {
    /// Contract: the lower bound always admits its own zero-filled version.
    #[test]
    fn lower_bound_admits_zero_filled(s in bounded_partial_strategy()) {
        let partial: PartialVersion = s.parse().expect("valid partial");
        let floor = partial.lower_bound();
        prop_assert!(floor.matches(&partial.zero_filled()));
    }

    /// Contract: a strict upper bound never admits its own ceiling.
    #[test]
    fn exclusive_ceiling_is_excluded(s in bounded_partial_strategy()) {
        let partial: PartialVersion = s.parse().expect("valid partial");
        if let Some(upper) = partial.upper_bound() {
            if !partial.is_fully_specified() {
                prop_assert!(!upper.matches(&upper.version));
            }
        }
    }

    /// Contract: tilde and caret both admit the version they were written
    /// with.
    #[test]
    fn tilde_and_caret_admit_their_floor(s in bounded_partial_strategy()) {
        let partial: PartialVersion = s.parse().expect("valid partial");
        let floor = partial.zero_filled();
        let tilde = AdvancedComparator::tilde(partial.clone());
        let caret = AdvancedComparator::caret(partial);
        prop_assert!(tilde.matches(&floor), "~{} should admit {}", s, floor);
        prop_assert!(caret.matches(&floor), "^{} should admit {}", s, floor);
    }

    /// Contract: every range match is witnessed by one clause whose
    /// comparators all accept the version.
    #[test]
    fn range_match_implies_clause_match(
        range_s in range_string_strategy(),
        version in version_strategy(),
    ) {
        let range: Range = range_s.parse().expect("valid range");
        if range.matches(&version) {
            let some_clause_matches = range
                .comparator_sets()
                .iter()
                .any(|set| set.comparators().iter().all(|c| c.matches(&version)));
            prop_assert!(some_clause_matches);
        }
    }
}
