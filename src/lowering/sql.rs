//! Relational lowering: parameterized SQL text plus the ordered bindings
//! that fill its placeholders.

use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;
use crate::lowering::Binding;
use crate::query::builder::QueryDescriptor;
use crate::query::factor::{ByClause, ByFactor};
use crate::query::keywords::Keyword;
use crate::query::projection::ProjectionKeyword;
use crate::schema::OrderDirection;

/// One parameterized statement. `bindings` is ordered to match the `?`
/// placeholders in `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlQuery {
    pub text: String,
    pub bindings: Vec<Binding>,
}

/// Lower a validated descriptor into one SQL statement.
pub fn lower(descriptor: &QueryDescriptor) -> SqlQuery {
    let table = descriptor.schema.name();
    let mut bindings = Vec::new();

    let text = match descriptor.action {
        ActionKind::Find => {
            let mut text = format!("select {} from {table}", select_list(descriptor));
            push_where(descriptor, &mut text, &mut bindings);
            push_order_by(descriptor, &mut text);
            if let Some(projection) = &descriptor.projection {
                if let Some(limit) = projection.limit() {
                    text.push_str(&format!(" limit {limit}"));
                }
                if let Some(skip) = projection.skip() {
                    text.push_str(&format!(" offset {skip}"));
                }
            }
            text
        }
        ActionKind::Exists => {
            let mut text = format!("select 1 from {table}");
            push_where(descriptor, &mut text, &mut bindings);
            text
        }
        ActionKind::Insert => {
            let columns = descriptor.schema.columns();
            let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
            let placeholders = vec!["?"; columns.len()];
            for column in columns {
                bindings.push(Binding::EntityField(column.name.clone()));
            }
            format!(
                "insert into {table} ({}) values ({})",
                names.join(", "),
                placeholders.join(", ")
            )
        }
        ActionKind::Update => {
            let mut text = format!("update {table} set {}", set_list(descriptor, &mut bindings));
            push_where(descriptor, &mut text, &mut bindings);
            text
        }
        ActionKind::Delete => {
            let mut text = format!("delete from {table}");
            push_where(descriptor, &mut text, &mut bindings);
            text
        }
    };

    SqlQuery { text, bindings }
}

fn select_list(descriptor: &QueryDescriptor) -> String {
    let Some(projection) = &descriptor.projection else {
        return "*".to_string();
    };
    let mut list = projection.column_name().unwrap_or("*").to_string();
    if matches!(projection.summary(), Some(ProjectionKeyword::Avg)) {
        list = format!("avg({list})");
    }
    if projection.distinct() {
        list = format!("distinct {list}");
    }
    list
}

fn set_list(descriptor: &QueryDescriptor, bindings: &mut Vec<Binding>) -> String {
    if descriptor.assignments.is_empty() {
        // no explicit assignments: write every non-key field of the entity
        let fragments: Vec<String> = descriptor
            .schema
            .non_key_columns()
            .iter()
            .map(|column| {
                bindings.push(Binding::EntityField(column.name.clone()));
                format!("{}=?", column.name)
            })
            .collect();
        return fragments.join(", ");
    }
    let fragments: Vec<String> = descriptor
        .assignments
        .iter()
        .map(|assignment| {
            bindings.push(Binding::Parameter(assignment.param.clone()));
            format!("{}=?", assignment.column)
        })
        .collect();
    fragments.join(", ")
}

/// Append the where clause: the By factors as written, or an all-AND chain
/// over the key columns when the entity itself is bound, or nothing.
fn push_where(descriptor: &QueryDescriptor, text: &mut String, bindings: &mut Vec<Binding>) {
    if let Some(by) = &descriptor.by {
        text.push_str(" where ");
        text.push_str(&where_for_factors(by, bindings));
    } else if descriptor.self_binding.is_some() {
        text.push_str(" where ");
        text.push_str(&where_for_keys(descriptor, bindings));
    }
}

/// Factors left to right, `and`/`or` exactly as encountered. No
/// parentheses and no precedence regrouping.
fn where_for_factors(by: &ByClause, bindings: &mut Vec<Binding>) -> String {
    let mut text = String::new();
    for factor in &by.factors {
        match factor {
            ByFactor::Variable(variable) => {
                text.push_str(&variable.column);
                text.push_str(sql_operator(variable.keyword));
                for param in &variable.params {
                    bindings.push(Binding::Parameter(param.clone()));
                }
            }
            ByFactor::Connector(connector) => {
                text.push(' ');
                text.push_str(connector.as_sql());
                text.push(' ');
            }
        }
    }
    text
}

fn where_for_keys(descriptor: &QueryDescriptor, bindings: &mut Vec<Binding>) -> String {
    let fragments: Vec<String> = descriptor
        .schema
        .key_columns()
        .iter()
        .map(|column| {
            bindings.push(Binding::EntityField(column.name.clone()));
            format!("{}=?", column.name)
        })
        .collect();
    fragments.join(" and ")
}

fn push_order_by(descriptor: &QueryDescriptor, text: &mut String) {
    let Some(order_by) = &descriptor.order_by else {
        return;
    };
    let fragments: Vec<String> = order_by
        .variables()
        .map(|(column, direction)| match direction {
            None => column.to_string(),
            Some(OrderDirection::Ascending) => format!("{column} asc"),
            Some(OrderDirection::Descending) => format!("{column} desc"),
        })
        .collect();
    text.push_str(" order by ");
    text.push_str(&fragments.join(", "));
}

fn sql_operator(keyword: Keyword) -> &'static str {
    match keyword {
        Keyword::Equals => "=?",
        Keyword::LessThan => "<?",
        Keyword::IsNull => " is null",
        Keyword::IsNotNull => " is not null",
    }
}
