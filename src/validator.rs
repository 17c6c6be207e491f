//! Column-vocabulary validation and fuzzy "did you mean" suggestions.

use strsim::levenshtein;

use crate::error::FindByError;
use crate::schema::EntitySchema;

/// Look up a column, turning a miss into an UnknownColumn error with a
/// suggestion when a close name exists.
pub fn require_column<'a>(
    schema: &'a EntitySchema,
    column: &str,
) -> Result<&'a crate::schema::Column, FindByError> {
    schema
        .column(column)
        .ok_or_else(|| FindByError::UnknownColumn {
            entity: schema.name().to_string(),
            column: column.to_string(),
            suggestion: did_you_mean(column, schema.column_names().iter().map(String::as_str)),
        })
}

/// Find the best candidate within a length-scaled Levenshtein threshold.
pub fn did_you_mean<'a>(input: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    // Dynamic threshold based on length
    let threshold = match input.len() {
        0..=2 => 0,
        3..=5 => 2,
        _ => 3,
    };

    let mut best_match = None;
    let mut min_dist = usize::MAX;
    for candidate in candidates {
        let dist = levenshtein(input, candidate);
        if dist <= threshold && dist < min_dist {
            min_dist = dist;
            best_match = Some(candidate.to_string());
        }
    }
    best_match
}
