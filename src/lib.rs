//! findby derives a fully validated, backend-agnostic query description
//! from a declaratively named repository operation (for example
//! `findByUsernameAndPasswordOrderByCreatedAtDesc`) and an entity's column
//! schema, then lowers it into a parameterized SQL statement or a
//! document-store filter tree.
//!
//! ```rust
//! use findby::engine::QueryEngine;
//! use findby::schema::{Column, ColumnType, EntitySchema};
//! use findby::signature::{OperationSignature, Parameter, ReturnDescriptor, ReturnKind};
//!
//! # fn main() -> Result<(), findby::error::FindByError> {
//! let engine = QueryEngine::new();
//! engine.register_schema("users", || {
//!     EntitySchema::new(
//!         "users",
//!         vec![
//!             Column::new("id", ColumnType::Int64),
//!             Column::new("username", ColumnType::Text).with_max_length(64),
//!         ],
//!         vec!["id".into()],
//!         vec![],
//!     )
//! })?;
//!
//! let signature = OperationSignature::new(
//!     vec![Parameter::scalar("username", ColumnType::Text)],
//!     ReturnDescriptor::sync(ReturnKind::Entity),
//! );
//! let descriptor = engine.derive("findByUsername", "users", &signature)?;
//! let query = engine.lower_sql(&descriptor);
//! assert_eq!(query.text, "select * from users where username=?");
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod engine;
pub mod error;
pub mod limits;
pub mod lowering;
pub mod query;
pub mod schema;
pub mod segment;
pub mod signature;
pub mod validator;

pub use engine::QueryEngine;

pub mod prelude {
    pub use crate::actions::{ActionKind, ActionRegistry};
    pub use crate::engine::QueryEngine;
    pub use crate::error::{FindByError, FindByResult};
    pub use crate::limits::{Engine, LimitsEnforcer};
    pub use crate::lowering::document::DocumentQuery;
    pub use crate::lowering::sql::SqlQuery;
    pub use crate::query::builder::QueryDescriptor;
    pub use crate::schema::{Column, ColumnType, EntitySchema};
    pub use crate::signature::{OperationSignature, Parameter, ReturnDescriptor, ReturnKind};
}
