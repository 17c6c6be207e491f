//! Identifier segmentation and greedy longest-prefix matching.
//!
//! A method name like `findByUniqueIdAndUsername` splits into case-delimited
//! segments `[find, By, Unique, Id, And, Username]`. Clause readers then
//! re-assemble runs of segments and test them against a vocabulary, always
//! keeping the longest run that still matches.

/// Split an identifier into segments at uppercase transitions. The first
/// segment is the leading action keyword and keeps its (lowercase) casing;
/// every other segment starts with the uppercase character that opened it.
pub fn split_segments(name: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in name.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Lowercase the first character, turning a segment run back into a
/// camelCase column name (`UniqueId` -> `uniqueId`).
pub fn uncapitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Greedy longest-prefix match: starting at `offset`, grow a candidate by
/// appending segments one at a time, re-testing `matcher` after each, and
/// keep the last (longest) success. Returns the match and the index of the
/// last consumed segment.
///
/// Longest wins by construction: with columns `uniqueId` and `unique` both
/// registered, segments `[Unique, Id, ...]` resolve to `uniqueId`.
pub fn largest_match<T, F>(segments: &[String], offset: usize, matcher: F) -> Option<(T, usize)>
where
    F: Fn(&str) -> Option<T>,
{
    let mut candidate = String::new();
    let mut best = None;

    for (i, segment) in segments.iter().enumerate().skip(offset) {
        candidate.push_str(segment);
        if let Some(value) = matcher(&candidate) {
            best = Some((value, i));
        }
    }
    best
}
