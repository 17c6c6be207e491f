//! Backend lowerings of a validated query descriptor.
//!
//! Both backends walk the same factor sequences. The relational lowering
//! emits flat SQL text with positional placeholders; the document lowering
//! builds a prefix filter tree. Neither regroups And/Or by precedence: the
//! composition is strictly positional, exactly as written in the name.

use serde::{Deserialize, Serialize};

pub mod document;
pub mod sql;

#[cfg(test)]
mod tests;

/// Where one bound value comes from at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    /// A named operation parameter.
    Parameter(String),
    /// A field read off the bound entity parameter.
    EntityField(String),
}
