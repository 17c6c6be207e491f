//! Descriptor builder: composes the clauses read out of an operation name
//! with the operation's signature and the action contract, producing the
//! validated query descriptor both lowerings consume.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actions::{ActionKind, ActionRegistry};
use crate::error::{FindByError, FindByResult};
use crate::query::factor::{ByClause, ByFactor, OrderByClause, ProjectionClause};
use crate::query::keywords::KeywordRegistry;
use crate::query::projection::{ProjectionCategory, ProjectionRegistry};
use crate::query::reader::ClauseReader;
use crate::schema::{ColumnType, EntitySchema};
use crate::signature::{OperationSignature, ParamType, ReturnDescriptor};
use crate::validator::require_column;

/// The entity-typed parameter an operation binds when it has no By clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfBinding {
    pub param: String,
    pub collection: bool,
}

/// One column assignment in an update's SET list, fed by a named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAssignment {
    pub column: String,
    pub param: String,
}

/// The validated intermediate representation of one derived operation.
/// Built once per operation; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub operation: String,
    pub action: ActionKind,
    pub schema: Arc<EntitySchema>,
    pub projection: Option<ProjectionClause>,
    pub by: Option<ByClause>,
    pub order_by: Option<OrderByClause>,
    /// Present when the entity itself stands in for the By clause.
    pub self_binding: Option<SelfBinding>,
    /// Explicit SET list for update; empty means "every non-key column of
    /// the bound entity".
    pub assignments: Vec<SetAssignment>,
    pub returns: ReturnDescriptor,
}

impl QueryDescriptor {
    /// The projected column name, when the operation projects one.
    pub fn projected_column(&self) -> Option<&str> {
        self.projection.as_ref().and_then(|p| p.column_name())
    }
}

/// Builds and validates descriptors against the registries it borrows.
pub struct DescriptorBuilder<'a> {
    actions: &'a ActionRegistry,
    keywords: &'a KeywordRegistry,
    projections: &'a ProjectionRegistry,
}

impl<'a> DescriptorBuilder<'a> {
    pub fn new(
        actions: &'a ActionRegistry,
        keywords: &'a KeywordRegistry,
        projections: &'a ProjectionRegistry,
    ) -> Self {
        Self {
            actions,
            keywords,
            projections,
        }
    }

    pub fn build(
        &self,
        operation: &str,
        schema: Arc<EntitySchema>,
        signature: &OperationSignature,
    ) -> FindByResult<QueryDescriptor> {
        let vocabulary = schema.column_names();
        let read =
            ClauseReader::new(operation, &vocabulary, self.keywords, self.projections).read()?;

        let Some(contract) = self.actions.find(&read.action_name) else {
            return Err(FindByError::UnsupportedAction(read.action_name));
        };
        let action = contract.kind;

        if !contract.supports_by && (read.by.is_some() || read.order_by.is_some()) {
            return Err(FindByError::malformed(
                operation,
                format!("action '{action}' does not take a By or OrderBy clause"),
            ));
        }

        let projected = self.validate_projection(operation, &schema, contract, &read.projection)?;
        self.validate_order_by(&schema, &read.order_by)?;

        let mut by = read.by;
        let mut self_binding = None;
        let mut assignments = Vec::new();

        if let Some(by) = by.as_mut() {
            let consumed = self.bind_by_params(operation, &schema, by, signature)?;
            let remaining = &signature.params[consumed..];
            if action == ActionKind::Update {
                assignments = self.build_assignments(operation, &schema, remaining)?;
            } else if !remaining.is_empty() {
                return Err(FindByError::ParameterCountMismatch {
                    operation: operation.to_string(),
                    expected: consumed,
                    received: signature.params.len(),
                });
            }
        } else if let Some(param) = signature.sole_self_param() {
            if !contract.accepts_self {
                return Err(FindByError::type_mismatch(
                    operation,
                    format!("action '{action}' does not accept the entity as its parameter"),
                ));
            }
            self_binding = Some(SelfBinding {
                param: param.name.clone(),
                collection: param.ty == ParamType::EntityCollection,
            });
        } else if action == ActionKind::Insert {
            // insert always writes a bound entity
            return Err(FindByError::ParameterCountMismatch {
                operation: operation.to_string(),
                expected: 1,
                received: signature.params.len(),
            });
        } else if !signature.params.is_empty() {
            return Err(FindByError::ParameterCountMismatch {
                operation: operation.to_string(),
                expected: 0,
                received: signature.params.len(),
            });
        }

        if action == ActionKind::Update && self_binding.is_none() && assignments.is_empty() {
            return Err(FindByError::type_mismatch(
                operation,
                "update needs a bound entity or trailing parameters naming the columns to set",
            ));
        }

        contract
            .return_rule
            .validate(operation, signature.returns.kind, projected)?;

        Ok(QueryDescriptor {
            operation: operation.to_string(),
            action,
            schema,
            projection: read.projection,
            by,
            order_by: read.order_by,
            self_binding,
            assignments,
            returns: signature.returns,
        })
    }

    /// Check the projection clause against the contract and compute the
    /// effective projected scalar type for return validation. Avg over any
    /// numeric column projects a float.
    fn validate_projection(
        &self,
        operation: &str,
        schema: &EntitySchema,
        contract: &crate::actions::ActionContract,
        projection: &Option<ProjectionClause>,
    ) -> FindByResult<Option<ColumnType>> {
        let Some(projection) = projection else {
            return Ok(None);
        };

        if contract.projection_categories.is_empty() {
            return Err(FindByError::UnsupportedProjection(format!(
                "action '{}' does not support projections",
                contract.kind
            )));
        }

        let mut seen: Vec<ProjectionCategory> = Vec::new();
        for keyword in projection.keywords() {
            let category = keyword.category();
            if !contract.supports_category(category) {
                return Err(FindByError::UnsupportedProjection(format!(
                    "keyword {} ({category}) is not supported by action '{}'",
                    keyword.name(),
                    contract.kind
                )));
            }
            if seen.contains(&category) {
                return Err(FindByError::UnsupportedProjection(format!(
                    "more than one {category} keyword in '{operation}'"
                )));
            }
            seen.push(category);
        }

        let column = match projection.column_name() {
            Some(name) => Some(require_column(schema, name)?),
            None => None,
        };

        let Some(summary) = projection.summary() else {
            return Ok(column.map(|c| c.ty));
        };
        let Some(column) = column else {
            return Err(FindByError::UnsupportedProjection(format!(
                "keyword {} requires a column in '{operation}'",
                summary.name()
            )));
        };
        if !column.ty.is_integer() && !column.ty.is_float() {
            return Err(FindByError::type_mismatch(
                operation,
                format!(
                    "{} requires a numeric column, '{}' is {}",
                    summary.name(),
                    column.name,
                    column.ty
                ),
            ));
        }
        // averages of integral columns still come back fractional
        Ok(Some(ColumnType::Float64))
    }

    fn validate_order_by(
        &self,
        schema: &EntitySchema,
        order_by: &Option<OrderByClause>,
    ) -> FindByResult<()> {
        if let Some(order_by) = order_by {
            for (column, _) in order_by.variables() {
                require_column(schema, column)?;
            }
        }
        Ok(())
    }

    /// Bind operation parameters to the By clause's conditions in order,
    /// validating each against the bound column and keyword. Returns the
    /// number of parameters consumed.
    fn bind_by_params(
        &self,
        operation: &str,
        schema: &EntitySchema,
        by: &mut ByClause,
        signature: &OperationSignature,
    ) -> FindByResult<usize> {
        let required: usize = by.variables().map(|v| v.keyword.input_count()).sum();
        if signature.params.len() < required {
            return Err(FindByError::ParameterCountMismatch {
                operation: operation.to_string(),
                expected: required,
                received: signature.params.len(),
            });
        }

        let mut cursor = 0;
        for factor in &mut by.factors {
            let ByFactor::Variable(variable) = factor else {
                continue;
            };
            let column = require_column(schema, &variable.column)?;
            for _ in 0..variable.keyword.input_count() {
                let param = &signature.params[cursor];
                cursor += 1;
                let ParamType::Scalar(ty) = param.ty else {
                    return Err(FindByError::type_mismatch(
                        operation,
                        format!("parameter '{}' must be a scalar", param.name),
                    ));
                };
                variable
                    .keyword
                    .validate_input(operation, column, &param.name, ty)?;
                variable.params.push(param.name.clone());
            }
        }
        Ok(cursor)
    }

    /// Trailing parameters of an update become its SET list; each must name
    /// an assignable column.
    fn build_assignments(
        &self,
        operation: &str,
        schema: &EntitySchema,
        remaining: &[crate::signature::Parameter],
    ) -> FindByResult<Vec<SetAssignment>> {
        let mut assignments = Vec::with_capacity(remaining.len());
        for param in remaining {
            let column = require_column(schema, &param.name)?;
            let ParamType::Scalar(ty) = param.ty else {
                return Err(FindByError::type_mismatch(
                    operation,
                    format!("parameter '{}' must be a scalar", param.name),
                ));
            };
            if !ty.assignable_to(column.ty) {
                return Err(FindByError::type_mismatch(
                    operation,
                    format!(
                        "parameter '{}' has type {ty}, not assignable to column '{}' of type {}",
                        param.name, column.name, column.ty
                    ),
                ));
            }
            assignments.push(SetAssignment {
                column: column.name.clone(),
                param: param.name.clone(),
            });
        }
        Ok(assignments)
    }
}
