//! Error types for findby.

use thiserror::Error;

use crate::limits::EngineViolations;

#[derive(Debug, Error)]
pub enum FindByError {
    /// The method name could not be parsed into clauses.
    #[error("Malformed method name '{name}': {message}")]
    MalformedMethodName { name: String, message: String },

    /// A clause or projection referenced a column the entity doesn't have.
    #[error("Unknown column '{column}' for entity '{entity}'{}", suggestion_text(.suggestion))]
    UnknownColumn {
        entity: String,
        column: String,
        suggestion: Option<String>,
    },

    /// A parameter, column, or return type failed a compatibility check.
    #[error("Type mismatch in '{operation}': {message}")]
    TypeMismatch { operation: String, message: String },

    /// The operation declares fewer or more parameters than its clauses consume.
    #[error("Expected {expected} parameters for '{operation}', received {received}")]
    ParameterCountMismatch {
        operation: String,
        expected: usize,
        received: usize,
    },

    /// The leading segment names no registered action.
    #[error("Unknown action '{0}'. Expected: find, exists, insert, update, or delete")]
    UnsupportedAction(String),

    /// A projection keyword is unsupported for the action, duplicated, or incomplete.
    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    /// The schema provider's input broke a structural invariant, or no
    /// schema is registered for the entity.
    #[error("Invalid schema for entity '{entity}': {message}")]
    InvalidSchema { entity: String, message: String },

    /// One or more engines rejected the entity schema. Every engine is always
    /// checked; this carries the complete grouped report.
    #[error("Entity '{entity}' failed validation for {} database engine(s):\n{}", .violations.len(), render_violations(.violations))]
    DialectLimits {
        entity: String,
        violations: Vec<EngineViolations>,
    },
}

impl FindByError {
    /// Create a malformed-method-name error for the given operation.
    pub fn malformed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedMethodName {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a type-mismatch error for the given operation.
    pub fn type_mismatch(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

fn suggestion_text(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(". Did you mean '{name}'?"),
        None => String::new(),
    }
}

fn render_violations(violations: &[EngineViolations]) -> String {
    let mut out = String::new();
    for group in violations {
        out.push_str(&format!("  {}:\n", group.engine));
        for failure in &group.failures {
            out.push_str(&format!("    - {failure}\n"));
        }
    }
    out
}

/// Result type alias for findby operations.
pub type FindByResult<T> = Result<T, FindByError>;
