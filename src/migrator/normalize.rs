// ABOUTME: Derives the destination name of a workspace by dropping its environment suffix
// ABOUTME: Suffixes are a fixed table matched case-insensitively, longest match wins

use tracing::debug;

/// Environment suffixes stripped from workspace names, in lookup order.
pub const ENVIRONMENT_SUFFIXES: &[&str] = &[
    "-stg",
    "-prd",
    "-dev",
    "-prod",
    "-staging",
    "-production",
    "-test",
    "-qa",
    "-uat",
];

/// Returns `name` without its environment suffix, or `name` unchanged.
///
/// A name made only of a suffix (`"-prod"`) is returned as is so the
/// destination key never collapses to an empty segment.
pub fn normalize_name(name: &str) -> String {
    let matched = ENVIRONMENT_SUFFIXES
        .iter()
        .copied()
        .filter(|suffix| ends_with_ignore_case(name, suffix))
        .max_by_key(|suffix| suffix.len());

    match matched {
        Some(suffix) if name.len() > suffix.len() => {
            let normalized = &name[..name.len() - suffix.len()];
            debug!(
                original_name = %name,
                normalized_name = %normalized,
                removed_suffix = %suffix,
                "Stripped environment suffix"
            );
            normalized.to_string()
        }
        _ => name.to_string(),
    }
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    let Some(start) = name.len().checked_sub(suffix.len()) else {
        return false;
    };
    name.is_char_boundary(start) && name[start..].eq_ignore_ascii_case(suffix)
}
