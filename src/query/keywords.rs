//! Operator keywords for by clauses and their type contracts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FindByError, FindByResult};
use crate::schema::{Column, ColumnType};

/// A by-clause operator. A closed union: lowering matches exhaustively, so
/// an unsupported keyword is a compile error rather than a runtime fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyword {
    /// The implicit default when a variable carries no keyword.
    Equals,
    LessThan,
    IsNull,
    IsNotNull,
}

impl Keyword {
    /// Recognized spellings, primary name first.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Equals => &["Equals"],
            Self::LessThan => &["LessThan"],
            Self::IsNull => &["IsNull", "Null"],
            Self::IsNotNull => &["IsNotNull", "NotNull"],
        }
    }

    pub fn name(self) -> &'static str {
        self.names()[0]
    }

    /// How many operation parameters this keyword consumes.
    pub fn input_count(self) -> usize {
        match self {
            Self::Equals | Self::LessThan => 1,
            Self::IsNull | Self::IsNotNull => 0,
        }
    }

    /// Whether a parameter of `ty` is acceptable as this keyword's input,
    /// independent of the bound column.
    pub fn accepts_input(self, ty: ColumnType) -> bool {
        match self {
            Self::Equals => true,
            Self::LessThan => ty.is_orderable(),
            Self::IsNull | Self::IsNotNull => false,
        }
    }

    /// Validate one parameter against the bound column and this keyword's
    /// accepted input set.
    pub fn validate_input(
        self,
        operation: &str,
        column: &Column,
        param_name: &str,
        param_ty: ColumnType,
    ) -> FindByResult<()> {
        if !param_ty.assignable_to(column.ty) {
            return Err(FindByError::type_mismatch(
                operation,
                format!(
                    "parameter '{param_name}' has type {param_ty}, not assignable to column '{}' of type {}",
                    column.name, column.ty
                ),
            ));
        }
        if !self.accepts_input(param_ty) {
            return Err(FindByError::type_mismatch(
                operation,
                format!(
                    "keyword {} does not accept parameter '{param_name}' of type {param_ty}",
                    self.name()
                ),
            ));
        }
        Ok(())
    }
}

/// Lookup table from keyword spelling to keyword. Constructed once and
/// passed into the engine; no process-wide statics.
#[derive(Debug, Clone)]
pub struct KeywordRegistry {
    by_name: HashMap<&'static str, Keyword>,
}

impl Default for KeywordRegistry {
    fn default() -> Self {
        Self::with_keywords(&[
            Keyword::Equals,
            Keyword::LessThan,
            Keyword::IsNull,
            Keyword::IsNotNull,
        ])
    }
}

impl KeywordRegistry {
    pub fn with_keywords(keywords: &[Keyword]) -> Self {
        let mut by_name = HashMap::new();
        for &keyword in keywords {
            for &name in keyword.names() {
                by_name.insert(name, keyword);
            }
        }
        Self { by_name }
    }

    pub fn find(&self, name: &str) -> Option<Keyword> {
        self.by_name.get(name).copied()
    }
}
