// Find flags such as `flag{...}` in challenge output.
use indexmap::IndexSet;

use std::ops::Range;

pub const DEFAULT_HEAD: &str = "{";
pub const DEFAULT_TAIL: &str = "}";

/// Every shortest `head ... tail` match in `haystack` that does not cross a
/// line break, de-duplicated in order of first appearance.
pub fn extract_flags_text(haystack: &str, head: &str, tail: &str) -> Vec<String> {
    match_ranges(haystack.as_bytes(), head.as_bytes(), tail.as_bytes())
        .into_iter()
        .filter_map(|range| haystack.get(range))
        .map(str::to_string)
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

pub fn extract_flags_bytes(haystack: &[u8], head: &[u8], tail: &[u8]) -> Vec<Vec<u8>> {
    match_ranges(haystack, head, tail)
        .into_iter()
        .map(|range| haystack[range].to_vec())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn match_ranges(haystack: &[u8], head: &[u8], tail: &[u8]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut pos = 0;
    while let Some(start) = find(haystack, head, pos) {
        let body_start = start + head.len();
        match find(haystack, tail, body_start) {
            Some(end)
                if end + tail.len() > start && !haystack[body_start..end].contains(&b'\n') =>
            {
                ranges.push(start..end + tail.len());
                pos = end + tail.len();
            }
            _ => pos = start + 1,
        }
    }
    ranges
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    if needle.is_empty() {
        return Some(from);
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|i| from + i)
}
