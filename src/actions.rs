//! Actions and their validation contracts.
//!
//! Every contract is plain data held by the registry, so a host that needs
//! different return rules (say, delete returning the removed entity) swaps
//! the table instead of patching match arms.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FindByError, FindByResult};
use crate::query::projection::ProjectionCategory;
use crate::schema::ColumnType;
use crate::signature::ReturnKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Find,
    Exists,
    Insert,
    Update,
    Delete,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Find => "find",
            Self::Exists => "exists",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What an action's declared return type must look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnRule {
    /// The entity, a collection of entities, or, when a projection column
    /// is present, a scalar the projected type is assignable to.
    EntityOrProjection,
    /// A bare boolean.
    Boolean,
    /// Nothing, or an integer affected-row count.
    WriteResult,
    /// Nothing, an integer affected-row count, or a success boolean.
    MutationResult,
}

impl ReturnRule {
    /// Check a declared return kind. `projected` carries the effective
    /// scalar type when the operation projects a single column.
    pub fn validate(
        self,
        operation: &str,
        returns: ReturnKind,
        projected: Option<ColumnType>,
    ) -> FindByResult<()> {
        let ok = match self {
            Self::EntityOrProjection => match projected {
                Some(ty) => matches!(returns, ReturnKind::Scalar(declared) if ty.assignable_to(declared)),
                None => returns.is_any_self(),
            },
            Self::Boolean => returns == ReturnKind::Boolean,
            Self::WriteResult => returns == ReturnKind::Void || returns.is_count(),
            Self::MutationResult => {
                returns == ReturnKind::Void || returns.is_count() || returns == ReturnKind::Boolean
            }
        };
        if ok {
            return Ok(());
        }
        Err(FindByError::type_mismatch(
            operation,
            match self {
                Self::EntityOrProjection => match projected {
                    Some(ty) => format!("return type must be a scalar assignable from {ty}"),
                    None => "return type must be the entity or a collection of it".to_string(),
                },
                Self::Boolean => "return type must be boolean".to_string(),
                Self::WriteResult => "return type must be void or an affected-row count".to_string(),
                Self::MutationResult => {
                    "return type must be void, an affected-row count, or boolean".to_string()
                }
            },
        ))
    }
}

/// The per-action validation contract consulted by the descriptor builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContract {
    pub kind: ActionKind,
    /// Whether the entity (or a collection of it) may be the sole parameter,
    /// standing in for an explicit By clause via the key columns.
    pub accepts_self: bool,
    pub supports_by: bool,
    pub projection_categories: Vec<ProjectionCategory>,
    pub return_rule: ReturnRule,
}

impl ActionContract {
    pub fn supports_category(&self, category: ProjectionCategory) -> bool {
        self.projection_categories.contains(&category)
    }
}

/// Maps the leading segment of an operation name to its contract.
/// Constructed once and handed to the engine.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    by_name: HashMap<&'static str, ActionContract>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_contracts(vec![
            ActionContract {
                kind: ActionKind::Find,
                accepts_self: true,
                supports_by: true,
                projection_categories: vec![
                    ProjectionCategory::Unique,
                    ProjectionCategory::Summary,
                    ProjectionCategory::Limit,
                    ProjectionCategory::Offset,
                ],
                return_rule: ReturnRule::EntityOrProjection,
            },
            ActionContract {
                kind: ActionKind::Exists,
                accepts_self: true,
                supports_by: true,
                projection_categories: vec![],
                return_rule: ReturnRule::Boolean,
            },
            ActionContract {
                kind: ActionKind::Insert,
                accepts_self: true,
                supports_by: false,
                projection_categories: vec![],
                return_rule: ReturnRule::WriteResult,
            },
            ActionContract {
                kind: ActionKind::Update,
                accepts_self: true,
                supports_by: true,
                projection_categories: vec![],
                return_rule: ReturnRule::MutationResult,
            },
            ActionContract {
                kind: ActionKind::Delete,
                accepts_self: true,
                supports_by: true,
                projection_categories: vec![],
                return_rule: ReturnRule::MutationResult,
            },
        ])
    }
}

impl ActionRegistry {
    pub fn with_contracts(contracts: Vec<ActionContract>) -> Self {
        let mut by_name = HashMap::new();
        for contract in contracts {
            by_name.insert(contract.kind.name(), contract);
        }
        Self { by_name }
    }

    pub fn find(&self, name: &str) -> Option<&ActionContract> {
        self.by_name.get(name)
    }
}
