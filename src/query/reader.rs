//! Clause reader: splits an operation name into segments and reads the
//! projection / by / order-by clauses out of them.
//!
//! `findByUniqueIdAndUsername` is handled like:
//! - `Unique` -> no column called `unique`? keep growing
//! - `UniqueId` -> column exists, remember it, keep growing
//! - `UniqueIdAnd` -> no match, `uniqueId` stays the longest
//! After the variable we look for an operator keyword; if none follows the
//! condition defaults to Equals.

use crate::error::{FindByError, FindByResult};
use crate::query::factor::{
    ByClause, ByFactor, Connector, OrderByClause, OrderFactor, ProjectionClause, ProjectionFactor,
    VariableCondition,
};
use crate::query::keywords::{Keyword, KeywordRegistry};
use crate::query::projection::ProjectionRegistry;
use crate::schema::OrderDirection;
use crate::segment::{largest_match, split_segments, uncapitalize};

/// The raw clause structure of one operation name, before semantic
/// validation binds parameters and checks the action contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    pub action_name: String,
    pub projection: Option<ProjectionClause>,
    pub by: Option<ByClause>,
    pub order_by: Option<OrderByClause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Projection,
    By,
    OrderBy,
}

impl Section {
    /// Sections may only appear in this order, each at most once.
    fn rank(self) -> u8 {
        match self {
            Self::Projection => 0,
            Self::By => 1,
            Self::OrderBy => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Projection => "projection",
            Self::By => "By",
            Self::OrderBy => "OrderBy",
        }
    }
}

/// Reads one operation name against a column vocabulary.
pub struct ClauseReader<'a> {
    name: &'a str,
    vocabulary: &'a [String],
    keywords: &'a KeywordRegistry,
    projections: &'a ProjectionRegistry,
}

impl<'a> ClauseReader<'a> {
    pub fn new(
        name: &'a str,
        vocabulary: &'a [String],
        keywords: &'a KeywordRegistry,
        projections: &'a ProjectionRegistry,
    ) -> Self {
        Self {
            name,
            vocabulary,
            keywords,
            projections,
        }
    }

    pub fn read(&self) -> FindByResult<ReadResult> {
        let segments = split_segments(self.name);
        let Some(action_name) = segments.first() else {
            return Err(self.malformed("operation name is empty"));
        };

        let mut result = ReadResult {
            action_name: action_name.clone(),
            projection: None,
            by: None,
            order_by: None,
        };

        let mut offset = 1;
        let mut previous: Option<Section> = None;

        while offset < segments.len() {
            let Some((section, body_offset)) = determine_section(&segments, offset, previous)
            else {
                break;
            };
            offset = body_offset;

            if offset >= segments.len() {
                return Err(self.malformed(format!("empty {} clause", section.label())));
            }

            match section {
                Section::Projection => {
                    result.projection = Some(self.read_projection(&segments, &mut offset)?);
                }
                Section::By => {
                    result.by = Some(self.read_by(&segments, &mut offset)?);
                }
                Section::OrderBy => {
                    result.order_by = Some(self.read_order_by(&segments, &mut offset)?);
                }
            }
            previous = Some(section);
        }

        if offset != segments.len() {
            return Err(self.malformed(format!(
                "unexpected remaining input '{}'",
                segments[offset..].join("")
            )));
        }

        Ok(result)
    }

    /// By clause: `variable [keyword] (connector variable [keyword])*`.
    /// Built through a state machine, so a sequence can neither start with
    /// a connector nor end on one.
    fn read_by(&self, segments: &[String], offset: &mut usize) -> FindByResult<ByClause> {
        let mut factors = Vec::new();

        loop {
            let Some((column, end)) = self.variable_match(segments, *offset) else {
                return Err(self.malformed(format!(
                    "no column matches '{}'",
                    segments[*offset..].join("")
                )));
            };
            *offset = end + 1;

            let mut keyword = Keyword::Equals;
            if !self.at_clause_end(segments, *offset, Section::By) {
                if let Some((found, end)) =
                    largest_match(segments, *offset, |candidate| self.keywords.find(candidate))
                {
                    keyword = found;
                    *offset = end + 1;
                }
            }
            factors.push(ByFactor::Variable(VariableCondition::new(column, keyword)));

            if self.at_clause_end(segments, *offset, Section::By) {
                break;
            }
            let Some(connector) = Connector::by_name(&segments[*offset]) else {
                return Err(self.malformed(format!(
                    "expected And/Or or a keyword, got '{}'",
                    segments[*offset..].join("")
                )));
            };
            factors.push(ByFactor::Connector(connector));
            *offset += 1;

            if self.at_clause_end(segments, *offset, Section::By) {
                return Err(self.malformed("By clause ends on a connector"));
            }
        }

        Ok(ByClause { factors })
    }

    /// OrderBy clause: like By, but the optional suffix is a single
    /// direction segment (Asc/Desc) instead of a greedy keyword match.
    fn read_order_by(&self, segments: &[String], offset: &mut usize) -> FindByResult<OrderByClause> {
        let mut factors = Vec::new();

        loop {
            let Some((column, end)) = self.variable_match(segments, *offset) else {
                return Err(self.malformed(format!(
                    "no column matches '{}'",
                    segments[*offset..].join("")
                )));
            };
            *offset = end + 1;

            let mut direction = None;
            if !self.at_clause_end(segments, *offset, Section::OrderBy) {
                direction = direction_by_name(&segments[*offset]);
                if direction.is_some() {
                    *offset += 1;
                }
            }
            factors.push(OrderFactor::Variable { column, direction });

            if self.at_clause_end(segments, *offset, Section::OrderBy) {
                break;
            }
            let Some(connector) = Connector::by_name(&segments[*offset]) else {
                return Err(self.malformed(format!(
                    "expected And/Or or Asc/Desc, got '{}'",
                    segments[*offset..].join("")
                )));
            };
            factors.push(OrderFactor::Connector(connector));
            *offset += 1;

            if self.at_clause_end(segments, *offset, Section::OrderBy) {
                return Err(self.malformed("OrderBy clause ends on a connector"));
            }
        }

        Ok(OrderByClause { factors })
    }

    /// Projection clause: any number of projection keywords followed by an
    /// optional target column. At least one of the two must be present.
    fn read_projection(
        &self,
        segments: &[String],
        offset: &mut usize,
    ) -> FindByResult<ProjectionClause> {
        let mut factors = Vec::new();

        while *offset < segments.len() {
            let Some(keyword) = self.projections.find(&segments[*offset]) else {
                break;
            };
            factors.push(ProjectionFactor::Keyword(keyword));
            *offset += 1;
        }

        if !self.at_clause_end(segments, *offset, Section::Projection) {
            if let Some((column, end)) = self.variable_match(segments, *offset) {
                factors.push(ProjectionFactor::Column(column));
                *offset = end + 1;
            } else if factors.is_empty() {
                return Err(self.malformed(format!(
                    "expected a projection keyword or column, got '{}'",
                    segments[*offset..].join("")
                )));
            }
        }

        Ok(ProjectionClause { factors })
    }

    /// Greedy column match: grow a segment run, uncapitalize it, and test
    /// it against the vocabulary. Longest match wins.
    fn variable_match(&self, segments: &[String], offset: usize) -> Option<(String, usize)> {
        largest_match(segments, offset, |candidate| {
            let name = uncapitalize(candidate);
            self.vocabulary.contains(&name).then_some(name)
        })
    }

    /// True at the end of the segments or at the start of a later section.
    fn at_clause_end(&self, segments: &[String], offset: usize, current: Section) -> bool {
        offset >= segments.len()
            || determine_section(segments, offset, Some(current)).is_some()
    }

    fn malformed(&self, message: impl Into<String>) -> FindByError {
        FindByError::malformed(self.name, message)
    }
}

/// Identify the section starting at `offset`, respecting section order.
/// OrderBy is tried before By (its marker is longer), and the projection
/// section only opens directly after the action.
fn determine_section(
    segments: &[String],
    offset: usize,
    previous: Option<Section>,
) -> Option<(Section, usize)> {
    let order_ok = |section: Section| previous.is_none_or(|p| section.rank() > p.rank());

    if segments[offset] == "Order"
        && segments.get(offset + 1).is_some_and(|s| s == "By")
        && order_ok(Section::OrderBy)
    {
        return Some((Section::OrderBy, offset + 2));
    }
    if segments[offset] == "By" && order_ok(Section::By) {
        return Some((Section::By, offset + 1));
    }
    if previous.is_none() {
        return Some((Section::Projection, offset));
    }
    None
}

fn direction_by_name(segment: &str) -> Option<OrderDirection> {
    match segment {
        "Asc" => Some(OrderDirection::Ascending),
        "Desc" => Some(OrderDirection::Descending),
        _ => None,
    }
}
