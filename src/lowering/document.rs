//! Document lowering: the same factor sequences become a binary filter
//! tree, built by a positional right-to-left pairing pass.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::actions::ActionKind;
use crate::lowering::Binding;
use crate::query::builder::QueryDescriptor;
use crate::query::factor::{ByFactor, Connector, VariableCondition};
use crate::query::keywords::Keyword;
use crate::schema::OrderDirection;

/// A binary filter tree. Connectors always hold exactly two operands; the
/// shape comes straight from the positional pairing, not from precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    Condition {
        column: String,
        keyword: Keyword,
        binding: Option<Binding>,
    },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
}

impl Filter {
    fn condition(variable: &VariableCondition) -> Self {
        Self::Condition {
            column: variable.column.clone(),
            keyword: variable.keyword,
            binding: variable
                .params
                .first()
                .map(|param| Binding::Parameter(param.clone())),
        }
    }

    fn key_equals(variable: &VariableCondition) -> Self {
        Self::Condition {
            column: variable.column.clone(),
            keyword: Keyword::Equals,
            binding: Some(Binding::EntityField(variable.column.clone())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Condition {
                column,
                keyword,
                binding,
            } => {
                let operand = binding.as_ref().map_or(Value::Null, binding_json);
                let test = match keyword {
                    Keyword::Equals => json!({ "$eq": operand }),
                    Keyword::LessThan => json!({ "$lt": operand }),
                    Keyword::IsNull => json!({ "$eq": Value::Null }),
                    Keyword::IsNotNull => json!({ "$ne": Value::Null }),
                };
                Value::Object(Map::from_iter([(column.clone(), test)]))
            }
            Self::And(left, right) => json!({ "$and": [left.to_json(), right.to_json()] }),
            Self::Or(left, right) => json!({ "$or": [left.to_json(), right.to_json()] }),
        }
    }
}

fn binding_json(binding: &Binding) -> Value {
    match binding {
        Binding::Parameter(name) => json!({ "$param": name }),
        Binding::EntityField(name) => json!({ "$field": name }),
    }
}

/// One sort key: 1 ascending, -1 descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub order: i32,
}

/// One field written by an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetField {
    pub column: String,
    pub binding: Binding,
}

/// A document-store command derived from one descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentQuery {
    Find {
        filter: Option<Filter>,
        sort: Vec<SortSpec>,
        limit: Option<u32>,
        skip: Option<u32>,
        distinct: bool,
        column: Option<String>,
    },
    /// A find constrained to one document; existence is the only answer.
    Exists { filter: Option<Filter> },
    Insert { param: String },
    Update {
        filter: Option<Filter>,
        set: Vec<SetField>,
    },
    Delete { filter: Option<Filter> },
}

impl DocumentQuery {
    /// Render the command as a JSON document against the collection name.
    pub fn to_json(&self, collection: &str) -> Value {
        let mut command = Map::new();
        match self {
            Self::Find {
                filter,
                sort,
                limit,
                skip,
                distinct,
                column,
            } => {
                command.insert("find".into(), json!(collection));
                if let Some(filter) = filter {
                    command.insert("filter".into(), filter.to_json());
                }
                if !sort.is_empty() {
                    let keys = sort
                        .iter()
                        .map(|spec| (spec.column.clone(), json!(spec.order)));
                    command.insert("sort".into(), Value::Object(Map::from_iter(keys)));
                }
                if let Some(limit) = limit {
                    command.insert("limit".into(), json!(limit));
                }
                if let Some(skip) = skip {
                    command.insert("skip".into(), json!(skip));
                }
                if let Some(column) = column {
                    let projection = Map::from_iter([(column.clone(), json!(1))]);
                    command.insert("projection".into(), Value::Object(projection));
                }
                if *distinct {
                    command.insert("distinct".into(), json!(true));
                }
            }
            Self::Exists { filter } => {
                command.insert("find".into(), json!(collection));
                if let Some(filter) = filter {
                    command.insert("filter".into(), filter.to_json());
                }
                command.insert("limit".into(), json!(1));
            }
            Self::Insert { param } => {
                command.insert("insert".into(), json!(collection));
                command.insert("documents".into(), json!({ "$entity": param }));
            }
            Self::Update { filter, set } => {
                command.insert("update".into(), json!(collection));
                if let Some(filter) = filter {
                    command.insert("filter".into(), filter.to_json());
                }
                let fields = set
                    .iter()
                    .map(|field| (field.column.clone(), binding_json(&field.binding)));
                command.insert(
                    "set".into(),
                    Value::Object(Map::from_iter(fields)),
                );
            }
            Self::Delete { filter } => {
                command.insert("delete".into(), json!(collection));
                if let Some(filter) = filter {
                    command.insert("filter".into(), filter.to_json());
                }
            }
        }
        Value::Object(command)
    }
}

/// Lower a validated descriptor into a document command.
pub fn lower(descriptor: &QueryDescriptor) -> DocumentQuery {
    let filter = filter_for(descriptor);
    match descriptor.action {
        ActionKind::Find => {
            let projection = descriptor.projection.as_ref();
            DocumentQuery::Find {
                filter,
                sort: sort_for(descriptor),
                limit: projection.and_then(|p| p.limit()),
                skip: projection.and_then(|p| p.skip()),
                distinct: projection.is_some_and(|p| p.distinct()),
                column: descriptor.projected_column().map(str::to_string),
            }
        }
        ActionKind::Exists => DocumentQuery::Exists { filter },
        ActionKind::Insert => DocumentQuery::Insert {
            param: descriptor
                .self_binding
                .as_ref()
                .map(|binding| binding.param.clone())
                .unwrap_or_default(),
        },
        ActionKind::Update => DocumentQuery::Update {
            filter,
            set: set_for(descriptor),
        },
        ActionKind::Delete => DocumentQuery::Delete { filter },
    }
}

fn filter_for(descriptor: &QueryDescriptor) -> Option<Filter> {
    if let Some(by) = &descriptor.by {
        return prefix_tree(&by.factors);
    }
    if descriptor.self_binding.is_some() {
        // key-fallback clause: an all-AND chain over the key columns,
        // binding entity fields instead of named parameters
        let mut factors = Vec::new();
        for (position, key) in descriptor.schema.keys().iter().enumerate() {
            if position > 0 {
                factors.push(ByFactor::Connector(Connector::And));
            }
            factors.push(ByFactor::Variable(VariableCondition::new(
                key.clone(),
                Keyword::Equals,
            )));
        }
        return prefix_tree_with(&factors, Filter::key_equals);
    }
    None
}

/// Positional infix-to-prefix conversion, scanning right to left. Each
/// condition becomes a leaf; a connector captures the tree built so far as
/// its right operand and pairs it with the next leaf to its left. For
/// `[A, And, B, Or, C]` this yields `And(A, Or(B, C))` - the grouping
/// follows position, not operator precedence.
pub fn prefix_tree(factors: &[ByFactor]) -> Option<Filter> {
    prefix_tree_with(factors, Filter::condition)
}

fn prefix_tree_with(
    factors: &[ByFactor],
    leaf: impl Fn(&VariableCondition) -> Filter,
) -> Option<Filter> {
    let mut result: Option<Filter> = None;
    let mut pending: Option<(Connector, Filter)> = None;

    for factor in factors.iter().rev() {
        match factor {
            ByFactor::Variable(variable) => {
                let operand = leaf(variable);
                result = Some(match pending.take() {
                    Some((Connector::And, right)) => {
                        Filter::And(Box::new(operand), Box::new(right))
                    }
                    Some((Connector::Or, right)) => Filter::Or(Box::new(operand), Box::new(right)),
                    None => operand,
                });
            }
            ByFactor::Connector(connector) => {
                // the clause reader guarantees a condition to the right
                if let Some(right) = result.take() {
                    pending = Some((*connector, right));
                }
            }
        }
    }
    result
}

fn sort_for(descriptor: &QueryDescriptor) -> Vec<SortSpec> {
    let Some(order_by) = &descriptor.order_by else {
        return Vec::new();
    };
    order_by
        .variables()
        .map(|(column, direction)| SortSpec {
            column: column.to_string(),
            order: match direction {
                Some(OrderDirection::Descending) => -1,
                _ => 1,
            },
        })
        .collect()
}

fn set_for(descriptor: &QueryDescriptor) -> Vec<SetField> {
    if !descriptor.assignments.is_empty() {
        return descriptor
            .assignments
            .iter()
            .map(|assignment| SetField {
                column: assignment.column.clone(),
                binding: Binding::Parameter(assignment.param.clone()),
            })
            .collect();
    }
    descriptor
        .schema
        .non_key_columns()
        .iter()
        .map(|column| SetField {
            column: column.name.clone(),
            binding: Binding::EntityField(column.name.clone()),
        })
        .collect()
}
