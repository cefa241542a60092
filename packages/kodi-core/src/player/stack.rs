//! Multi-part (`stack://`) items.
//!
//! A stack joins the parts of one title: `stack:///m/cd1.avi , /m/cd2.avi`.
//! Commas inside part paths are doubled.

use crate::constants::{STACK_PROTOCOL, STACK_SEPARATOR};

/// Splits a stack path into its part paths. Returns `None` for non-stack paths.
pub fn parse_stack(path: &str) -> Option<Vec<String>> {
    let body = path.strip_prefix(STACK_PROTOCOL)?;
    let parts: Vec<String> = body
        .split(STACK_SEPARATOR)
        .map(|part| part.trim().replace(",,", ","))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// Builds a stack path from part paths.
pub fn build_stack(parts: &[String]) -> String {
    let joined = parts
        .iter()
        .map(|part| part.replace(',', ",,"))
        .collect::<Vec<_>>()
        .join(STACK_SEPARATOR);
    format!("{STACK_PROTOCOL}{joined}")
}

/// Maps an offset into the whole stack to `(part index, offset within part)`.
///
/// Offsets past the end land at the end of the last part. Without durations
/// the offset applies to the first part.
pub fn resolve_offset(part_durations_ms: &[u64], offset_ms: u64) -> (usize, u64) {
    let Some(last) = part_durations_ms.len().checked_sub(1) else {
        return (0, offset_ms);
    };
    let mut remaining = offset_ms;
    for (index, duration) in part_durations_ms.iter().enumerate() {
        if remaining < *duration || index == last {
            return (index, remaining.min(*duration));
        }
        remaining -= duration;
    }
    (last, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_parts_and_escaped_commas() {
        let parts = parse_stack("stack:///m/cd1.avi , /m/Hello,, World cd2.avi").unwrap();
        assert_eq!(parts, vec!["/m/cd1.avi", "/m/Hello, World cd2.avi"]);
        assert_eq!(build_stack(&parts), "stack:///m/cd1.avi , /m/Hello,, World cd2.avi");
        assert!(parse_stack("/m/cd1.avi").is_none());
    }

    #[test]
    fn resolves_offset_into_parts() {
        let durations = [1_000, 2_000, 3_000];
        assert_eq!(resolve_offset(&durations, 0), (0, 0));
        assert_eq!(resolve_offset(&durations, 999), (0, 999));
        assert_eq!(resolve_offset(&durations, 1_000), (1, 0));
        assert_eq!(resolve_offset(&durations, 2_500), (1, 1_500));
        assert_eq!(resolve_offset(&durations, 3_000), (2, 0));
        assert_eq!(resolve_offset(&durations, 10_000), (2, 3_000));
    }

    #[test]
    fn offset_without_durations_applies_to_first_part() {
        assert_eq!(resolve_offset(&[], 4_000), (0, 4_000));
    }
}
