//! Projection keywords (Distinct, Avg, First, TopN, SkipN) and their registry.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Keyword category. At most one keyword per category may appear in a
/// projection clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionCategory {
    Unique,
    Summary,
    Limit,
    Offset,
}

impl ProjectionCategory {
    /// Summary keywords aggregate a single column and need one named.
    pub fn requires_column(self) -> bool {
        matches!(self, Self::Summary)
    }
}

impl std::fmt::Display for ProjectionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unique => "unique",
            Self::Summary => "summary",
            Self::Limit => "limit",
            Self::Offset => "offset",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionKeyword {
    Distinct,
    Avg,
    First,
    Top(u32),
    Skip(u32),
}

impl ProjectionKeyword {
    pub fn category(self) -> ProjectionCategory {
        match self {
            Self::Distinct => ProjectionCategory::Unique,
            Self::Avg => ProjectionCategory::Summary,
            Self::First | Self::Top(_) => ProjectionCategory::Limit,
            Self::Skip(_) => ProjectionCategory::Offset,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Distinct => "Distinct",
            Self::Avg => "Avg",
            Self::First => "First",
            Self::Top(_) => "Top",
            Self::Skip(_) => "Skip",
        }
    }
}

/// Resolves a single segment to a projection keyword: fixed names plus the
/// numeric-suffix patterns `Top[1-9][0-9]*` and `Skip[1-9][0-9]*`.
#[derive(Debug, Clone)]
pub struct ProjectionRegistry {
    top: Regex,
    skip: Regex,
}

impl Default for ProjectionRegistry {
    fn default() -> Self {
        Self {
            top: Regex::new(r"^Top([1-9][0-9]*)$").expect("valid pattern"),
            skip: Regex::new(r"^Skip([1-9][0-9]*)$").expect("valid pattern"),
        }
    }
}

impl ProjectionRegistry {
    pub fn find(&self, segment: &str) -> Option<ProjectionKeyword> {
        match segment {
            "Distinct" => return Some(ProjectionKeyword::Distinct),
            "Avg" => return Some(ProjectionKeyword::Avg),
            "First" => return Some(ProjectionKeyword::First),
            _ => {}
        }
        if let Some(captures) = self.top.captures(segment) {
            return captures[1].parse().ok().map(ProjectionKeyword::Top);
        }
        if let Some(captures) = self.skip.captures(segment) {
            return captures[1].parse().ok().map(ProjectionKeyword::Skip);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_names() {
        let registry = ProjectionRegistry::default();
        assert_eq!(registry.find("Distinct"), Some(ProjectionKeyword::Distinct));
        assert_eq!(registry.find("Avg"), Some(ProjectionKeyword::Avg));
        assert_eq!(registry.find("First"), Some(ProjectionKeyword::First));
        assert_eq!(registry.find("Last"), None);
    }

    #[test]
    fn test_parametric_names() {
        let registry = ProjectionRegistry::default();
        assert_eq!(registry.find("Top3"), Some(ProjectionKeyword::Top(3)));
        assert_eq!(registry.find("Skip10"), Some(ProjectionKeyword::Skip(10)));
        // no leading zeros, no bare keyword
        assert_eq!(registry.find("Top03"), None);
        assert_eq!(registry.find("Top"), None);
        assert_eq!(registry.find("Skip"), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ProjectionKeyword::Top(5).category(),
            ProjectionCategory::Limit
        );
        assert_eq!(
            ProjectionKeyword::First.category(),
            ProjectionCategory::Limit
        );
        assert!(ProjectionCategory::Summary.requires_column());
        assert!(!ProjectionCategory::Limit.requires_column());
    }
}
