//! Property-based tests for path handling and diagnostics.

use proptest::prelude::*;

use crate::graph::Diagnostics;
use crate::paths::{ParsedPath, join_path, normalize_path, resolve_relative};

/// Relative paths built from plain segments, `.` and `..`.
fn relative_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof!["[a-z]{1,6}", Just(".".to_string()), Just("..".to_string())], 1..=6)
        .prop_map(|parts| parts.join("/"))
}

fn module_path_strategy() -> impl Strategy<Value = String> {
    (prop::collection::vec("[a-z]{1,6}", 0..=3), "[a-z]{1,6}\\.(ts|js)")
        .prop_map(|(dirs, file)| dirs.into_iter().chain([file]).collect::<Vec<_>>().join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Normalizing twice changes nothing.
    #[test]
    fn prop_normalize_is_idempotent(path in relative_path_strategy()) {
        let once = normalize_path(&path);
        prop_assert_eq!(normalize_path(&once), once.clone());
        prop_assert!(!once.starts_with("./"));
    }

    /// Relative resolution always yields a project path.
    #[test]
    fn prop_resolve_relative_is_project_path(
        module in module_path_strategy(),
        raw in relative_path_strategy(),
    ) {
        let resolved = resolve_relative(&module, &format!("./{raw}"));
        prop_assert!(resolved.starts_with('.'));
    }

    /// A module path splits into a directory and base that join back to it.
    #[test]
    fn prop_parsed_path_round_trips(path in module_path_strategy()) {
        let parsed = ParsedPath::parse(&path);
        prop_assert_eq!(join_path(&parsed.dir, &parsed.base), path);
        prop_assert_eq!(format!("{}{}", parsed.name, parsed.ext), parsed.base);
    }

    /// Every message added at a position stays retrievable, in order.
    #[test]
    fn prop_diagnostics_keep_every_message(
        messages in prop::collection::vec(("[a-z ]{1,12}", 0u32..4), 1..10),
    ) {
        let mut diagnostics = Diagnostics::new();
        for (message, position) in &messages {
            diagnostics.add(*position, message.clone());
        }
        for position in 0u32..4 {
            let expected: Vec<&str> = messages
                .iter()
                .filter(|(_, p)| *p == position)
                .map(|(m, _)| m.as_str())
                .collect();
            match diagnostics.get(position) {
                Some(joined) => prop_assert_eq!(joined, expected.join("\n")),
                None => prop_assert!(expected.is_empty()),
            }
        }
    }
}
