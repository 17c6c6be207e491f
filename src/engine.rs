//! Query derivation engine.
//!
//! Owns the keyword, projection, and action registries, the dialect limits
//! table, and the per-entity schema cache. All of them are populated at
//! construction and read-only afterwards, so one engine can serve
//! concurrent derivations.

use std::sync::Arc;

use crate::actions::ActionRegistry;
use crate::error::{FindByError, FindByResult};
use crate::limits::LimitsEnforcer;
use crate::lowering::document::{self, DocumentQuery};
use crate::lowering::sql::{self, SqlQuery};
use crate::query::builder::{DescriptorBuilder, QueryDescriptor};
use crate::query::keywords::KeywordRegistry;
use crate::query::projection::ProjectionRegistry;
use crate::schema::{EntitySchema, SchemaCache};
use crate::signature::OperationSignature;

#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    actions: ActionRegistry,
    keywords: KeywordRegistry,
    projections: ProjectionRegistry,
    limits: LimitsEnforcer,
    schemas: SchemaCache,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in custom registries, e.g. different per-action return rules.
    pub fn with_registries(
        actions: ActionRegistry,
        keywords: KeywordRegistry,
        projections: ProjectionRegistry,
    ) -> Self {
        Self {
            actions,
            keywords,
            projections,
            ..Self::default()
        }
    }

    /// Register the schema for `entity`, deriving it on first use and
    /// checking it against every engine's structural limits. Idempotent:
    /// later calls return the memoized schema without re-deriving.
    pub fn register_schema<F>(&self, entity: &str, derive: F) -> FindByResult<Arc<EntitySchema>>
    where
        F: FnOnce() -> Result<EntitySchema, String>,
    {
        if let Some(found) = self.schemas.get(entity) {
            return Ok(found);
        }
        let invalid = |message: String| FindByError::InvalidSchema {
            entity: entity.to_string(),
            message,
        };
        let schema = derive().map_err(invalid)?;
        self.limits.enforce(&schema)?;
        self.schemas
            .get_or_derive(entity, move || Ok(schema))
            .map_err(invalid)
    }

    pub fn schema(&self, entity: &str) -> Option<Arc<EntitySchema>> {
        self.schemas.get(entity)
    }

    /// Derive the validated descriptor for one operation against a
    /// registered entity.
    pub fn derive(
        &self,
        operation: &str,
        entity: &str,
        signature: &OperationSignature,
    ) -> FindByResult<QueryDescriptor> {
        let Some(schema) = self.schemas.get(entity) else {
            return Err(FindByError::InvalidSchema {
                entity: entity.to_string(),
                message: "no schema registered".to_string(),
            });
        };
        self.derive_for(operation, schema, signature)
    }

    /// Derive against an explicit schema, bypassing the cache.
    pub fn derive_for(
        &self,
        operation: &str,
        schema: Arc<EntitySchema>,
        signature: &OperationSignature,
    ) -> FindByResult<QueryDescriptor> {
        DescriptorBuilder::new(&self.actions, &self.keywords, &self.projections)
            .build(operation, schema, signature)
    }

    /// Check a schema against every registered engine's limits.
    pub fn enforce_limits(&self, schema: &EntitySchema) -> FindByResult<()> {
        self.limits.enforce(schema)
    }

    pub fn lower_sql(&self, descriptor: &QueryDescriptor) -> SqlQuery {
        sql::lower(descriptor)
    }

    pub fn lower_document(&self, descriptor: &QueryDescriptor) -> DocumentQuery {
        document::lower(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType};
    use crate::signature::{Parameter, ReturnDescriptor, ReturnKind};

    fn users() -> EntitySchema {
        EntitySchema::new(
            "users",
            vec![
                Column::new("id", ColumnType::Int64),
                Column::new("username", ColumnType::Text).with_max_length(64),
            ],
            vec!["id".into()],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_register_then_derive() {
        let engine = QueryEngine::new();
        engine.register_schema("users", || Ok(users())).unwrap();

        let signature = OperationSignature::new(
            vec![Parameter::scalar("username", ColumnType::Text)],
            ReturnDescriptor::sync(ReturnKind::Entity),
        );
        let descriptor = engine
            .derive("findByUsername", "users", &signature)
            .unwrap();
        let query = engine.lower_sql(&descriptor);
        assert_eq!(query.text, "select * from users where username=?");
    }

    #[test]
    fn test_derive_without_schema() {
        let engine = QueryEngine::new();
        let signature =
            OperationSignature::new(vec![], ReturnDescriptor::sync(ReturnKind::EntityCollection));
        let err = engine.derive("find", "ghosts", &signature).unwrap_err();
        assert!(matches!(err, FindByError::InvalidSchema { .. }));
    }

    #[test]
    fn test_register_enforces_limits() {
        let engine = QueryEngine::new();
        let err = engine
            .register_schema("notes", || {
                Ok(EntitySchema::new(
                    "notes",
                    vec![Column::new("body", ColumnType::Text)],
                    vec![],
                    vec![],
                )?)
            })
            .unwrap_err();
        assert!(matches!(err, FindByError::DialectLimits { .. }));
    }
}
