//! Property-based tests for config rendering, id validation and image references.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use proptest::prelude::*;

use ranch_agent::domain::container::{DEFAULT_TAG, split_image_reference};
use ranch_agent::domain::{ClientId, ConfigMapping, render_properties};

// ============================================================================
// render_properties() property tests
// ============================================================================

proptest! {
    /// One line per entry, each `key=value`, keys ascending.
    #[test]
    fn prop_one_sorted_line_per_entry(
        config in prop::collection::btree_map("[a-z][a-z.]{0,15}", "[A-Za-z0-9/_:-]{0,20}", 0..20)
    ) {
        let config: ConfigMapping = config;
        let rendered = render_properties(&config);
        let lines: Vec<&str> = rendered.lines().collect();

        prop_assert_eq!(lines.len(), config.len());
        for (line, (key, value)) in lines.iter().zip(&config) {
            prop_assert_eq!(*line, format!("{key}={value}"));
        }
        prop_assert!(rendered.is_empty() || rendered.ends_with('\n'));
    }

    /// Rendering the same mapping twice yields identical bytes.
    #[test]
    fn prop_rendering_is_deterministic(
        pairs in prop::collection::vec(("[a-z]{1,8}", "[a-z0-9]{0,8}"), 0..10)
    ) {
        let forward: ConfigMapping = pairs.iter().cloned().collect();
        let backward: ConfigMapping = pairs.iter().rev().cloned().collect();
        // Duplicate keys keep the last insert, so only compare key order.
        prop_assert_eq!(
            render_properties(&forward).lines().map(|l| l.split('=').next().map(str::to_string)).collect::<Vec<_>>(),
            render_properties(&backward).lines().map(|l| l.split('=').next().map(str::to_string)).collect::<Vec<_>>()
        );
    }
}

// ============================================================================
// ClientId property tests
// ============================================================================

proptest! {
    #[test]
    fn prop_positive_ids_accepted(raw in 1i64..=i64::MAX) {
        let id = ClientId::new(raw).expect("positive id");
        prop_assert_eq!(id.get(), raw.unsigned_abs());
    }

    #[test]
    fn prop_non_positive_ids_rejected(raw in i64::MIN..=0) {
        prop_assert!(ClientId::new(raw).is_err());
    }
}

// ============================================================================
// split_image_reference() property tests
// ============================================================================

proptest! {
    /// An untagged repository always pulls the default tag.
    #[test]
    fn prop_untagged_image_gets_default_tag(repo in "[a-z]{1,10}(/[a-z]{1,10}){0,2}") {
        prop_assert_eq!(split_image_reference(&repo), (repo.as_str(), DEFAULT_TAG));
    }

    /// An explicit tag is split off, even behind a registry with a port.
    #[test]
    fn prop_tag_is_split(
        registry in "[a-z]{1,8}:[0-9]{2,5}",
        repo in "[a-z]{1,10}",
        tag in "[a-z0-9.]{1,10}",
    ) {
        let image = format!("{registry}/{repo}:{tag}");
        let (name, got) = split_image_reference(&image);
        prop_assert_eq!(name, format!("{registry}/{repo}"));
        prop_assert_eq!(got, tag.as_str());

        // A digest wins over the tag, and the tag never leaks into the repository.
        let pinned = format!("{image}@sha256:{tag}");
        let (name, got) = split_image_reference(&pinned);
        prop_assert_eq!(name, format!("{registry}/{repo}"));
        prop_assert_eq!(got, format!("sha256:{tag}"));
    }

    /// A trailing `:` never produces an empty tag.
    #[test]
    fn prop_empty_tag_falls_back_to_default(repo in "[a-z]{1,10}(/[a-z]{1,10}){0,2}") {
        let image = format!("{repo}:");
        prop_assert_eq!(split_image_reference(&image), (repo.as_str(), DEFAULT_TAG));
    }
}
