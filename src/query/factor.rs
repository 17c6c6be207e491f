//! Factor model: the units that make up by / order-by / projection clauses.

use serde::{Deserialize, Serialize};

use crate::query::keywords::Keyword;
use crate::query::projection::{ProjectionCategory, ProjectionKeyword};
use crate::schema::OrderDirection;

/// Boolean connector between two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "And" => Some(Self::And),
            "Or" => Some(Self::Or),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// One bound condition inside a by clause: a column, the operator keyword
/// applied to it, and the operation parameters consumed by that keyword.
/// The reader leaves `params` empty; the descriptor builder fills it while
/// validating types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableCondition {
    pub column: String,
    pub keyword: Keyword,
    #[serde(default)]
    pub params: Vec<String>,
}

impl VariableCondition {
    pub fn new(column: impl Into<String>, keyword: Keyword) -> Self {
        Self {
            column: column.into(),
            keyword,
            params: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByFactor {
    Variable(VariableCondition),
    Connector(Connector),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderFactor {
    Variable {
        column: String,
        /// None means the backend's default direction.
        direction: Option<OrderDirection>,
    },
    Connector(Connector),
}

/// A factor of the projection clause: a keyword or the explicit target column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionFactor {
    Keyword(ProjectionKeyword),
    Column(String),
}

/// The filter clause (`By...`). The reader's state machine guarantees the
/// factor sequence alternates variable / connector and never ends on a
/// connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByClause {
    pub factors: Vec<ByFactor>,
}

impl ByClause {
    pub fn variables(&self) -> impl Iterator<Item = &VariableCondition> {
        self.factors.iter().filter_map(|f| match f {
            ByFactor::Variable(v) => Some(v),
            ByFactor::Connector(_) => None,
        })
    }
}

/// The ordering clause (`OrderBy...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByClause {
    pub factors: Vec<OrderFactor>,
}

impl OrderByClause {
    pub fn variables(&self) -> impl Iterator<Item = (&str, Option<OrderDirection>)> {
        self.factors.iter().filter_map(|f| match f {
            OrderFactor::Variable { column, direction } => Some((column.as_str(), *direction)),
            OrderFactor::Connector(_) => None,
        })
    }
}

/// The projection clause between the action and the first By/OrderBy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionClause {
    pub factors: Vec<ProjectionFactor>,
}

impl ProjectionClause {
    /// The explicit target column, if one was named.
    pub fn column_name(&self) -> Option<&str> {
        self.factors.iter().find_map(|f| match f {
            ProjectionFactor::Column(name) => Some(name.as_str()),
            ProjectionFactor::Keyword(_) => None,
        })
    }

    pub fn keywords(&self) -> impl Iterator<Item = &ProjectionKeyword> {
        self.factors.iter().filter_map(|f| match f {
            ProjectionFactor::Keyword(k) => Some(k),
            ProjectionFactor::Column(_) => None,
        })
    }

    pub fn distinct(&self) -> bool {
        self.keywords()
            .any(|k| matches!(k, ProjectionKeyword::Distinct))
    }

    /// Row limit implied by First / TopN, if any.
    pub fn limit(&self) -> Option<u32> {
        self.keywords().find_map(|k| match k {
            ProjectionKeyword::First => Some(1),
            ProjectionKeyword::Top(n) => Some(*n),
            _ => None,
        })
    }

    /// Row offset implied by SkipN, if any.
    pub fn skip(&self) -> Option<u32> {
        self.keywords().find_map(|k| match k {
            ProjectionKeyword::Skip(n) => Some(*n),
            _ => None,
        })
    }

    /// Whether a summary keyword (Avg) applies to the projected column.
    pub fn summary(&self) -> Option<&ProjectionKeyword> {
        self.keywords()
            .find(|k| k.category() == ProjectionCategory::Summary)
    }
}
