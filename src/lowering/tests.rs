use std::sync::Arc;

use serde_json::json;

use crate::engine::QueryEngine;
use crate::lowering::Binding;
use crate::lowering::document::{self, DocumentQuery, Filter, SortSpec};
use crate::lowering::sql;
use crate::query::builder::QueryDescriptor;
use crate::query::keywords::Keyword;
use crate::schema::{Column, ColumnType, EntitySchema};
use crate::signature::{OperationSignature, Parameter, ReturnDescriptor, ReturnKind};

fn posts() -> Arc<EntitySchema> {
    Arc::new(
        EntitySchema::new(
            "posts",
            vec![
                Column::new("id", ColumnType::Int64),
                Column::new("title", ColumnType::Text).with_max_length(100),
                Column::new("views", ColumnType::Int32),
            ],
            vec!["id".into()],
            vec![],
        )
        .unwrap(),
    )
}

fn derive(operation: &str, params: Vec<Parameter>, returns: ReturnKind) -> QueryDescriptor {
    QueryEngine::new()
        .derive_for(
            operation,
            posts(),
            &OperationSignature::new(params, ReturnDescriptor::sync(returns)),
        )
        .unwrap()
}

fn params(names: &[(&str, ColumnType)]) -> Vec<Parameter> {
    names
        .iter()
        .map(|(name, ty)| Parameter::scalar(*name, *ty))
        .collect()
}

fn eq_condition(column: &str, param: &str) -> Filter {
    Filter::Condition {
        column: column.to_string(),
        keyword: Keyword::Equals,
        binding: Some(Binding::Parameter(param.to_string())),
    }
}

mod relational {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_with_and_chain() {
        let descriptor = derive(
            "findByIdAndTitle",
            params(&[("id", ColumnType::Int64), ("title", ColumnType::Text)]),
            ReturnKind::Entity,
        );
        let query = sql::lower(&descriptor);
        assert_eq!(query.text, "select * from posts where id=? and title=?");
        assert_eq!(
            query.bindings,
            vec![
                Binding::Parameter("id".into()),
                Binding::Parameter("title".into()),
            ]
        );
    }

    #[test]
    fn test_exists_with_or() {
        let descriptor = derive(
            "existsByIdOrTitle",
            params(&[("id", ColumnType::Int64), ("title", ColumnType::Text)]),
            ReturnKind::Boolean,
        );
        let query = sql::lower(&descriptor);
        assert_eq!(query.text, "select 1 from posts where id=? or title=?");
    }

    #[test]
    fn test_positional_composition_stays_flat() {
        // and/or exactly as written, no parentheses, no regrouping
        let descriptor = derive(
            "findByIdAndTitleOrViews",
            params(&[
                ("id", ColumnType::Int64),
                ("title", ColumnType::Text),
                ("views", ColumnType::Int32),
            ]),
            ReturnKind::EntityCollection,
        );
        let query = sql::lower(&descriptor);
        assert_eq!(
            query.text,
            "select * from posts where id=? and title=? or views=?"
        );
    }

    #[test]
    fn test_null_keywords_emit_no_placeholder() {
        let descriptor = derive("findByTitleIsNotNull", vec![], ReturnKind::EntityCollection);
        let query = sql::lower(&descriptor);
        assert_eq!(query.text, "select * from posts where title is not null");
        assert!(query.bindings.is_empty());
    }

    #[test]
    fn test_less_than() {
        let descriptor = derive(
            "findByViewsLessThan",
            params(&[("views", ColumnType::Int32)]),
            ReturnKind::EntityCollection,
        );
        assert_eq!(
            sql::lower(&descriptor).text,
            "select * from posts where views<?"
        );
    }

    #[test]
    fn test_delete() {
        let descriptor = derive(
            "deleteByIdAndTitle",
            params(&[("id", ColumnType::Int64), ("title", ColumnType::Text)]),
            ReturnKind::Void,
        );
        let query = sql::lower(&descriptor);
        assert_eq!(query.text, "delete from posts where id=? and title=?");
    }

    #[test]
    fn test_insert_positional_columns() {
        let descriptor = derive("insert", vec![Parameter::entity("post")], ReturnKind::Void);
        let query = sql::lower(&descriptor);
        assert_eq!(
            query.text,
            "insert into posts (id, title, views) values (?, ?, ?)"
        );
        assert_eq!(
            query.bindings,
            vec![
                Binding::EntityField("id".into()),
                Binding::EntityField("title".into()),
                Binding::EntityField("views".into()),
            ]
        );
    }

    #[test]
    fn test_update_with_assignments() {
        let descriptor = derive(
            "updateById",
            params(&[("id", ColumnType::Int64), ("title", ColumnType::Text)]),
            ReturnKind::Void,
        );
        let query = sql::lower(&descriptor);
        assert_eq!(query.text, "update posts set title=? where id=?");
        assert_eq!(
            query.bindings,
            vec![
                Binding::Parameter("title".into()),
                Binding::Parameter("id".into()),
            ]
        );
    }

    #[test]
    fn test_update_bound_entity_writes_non_keys() {
        let descriptor = derive("update", vec![Parameter::entity("post")], ReturnKind::Void);
        let query = sql::lower(&descriptor);
        assert_eq!(
            query.text,
            "update posts set title=?, views=? where id=?"
        );
        assert_eq!(
            query.bindings,
            vec![
                Binding::EntityField("title".into()),
                Binding::EntityField("views".into()),
                Binding::EntityField("id".into()),
            ]
        );
    }

    #[test]
    fn test_delete_bound_entity_uses_keys() {
        let descriptor = derive("delete", vec![Parameter::entity("post")], ReturnKind::Void);
        let query = sql::lower(&descriptor);
        assert_eq!(query.text, "delete from posts where id=?");
        assert_eq!(query.bindings, vec![Binding::EntityField("id".into())]);
    }

    #[test]
    fn test_order_limit_and_offset() {
        let descriptor = derive(
            "findTop3Skip2ByViewsOrderByTitleDescAndViews",
            params(&[("views", ColumnType::Int32)]),
            ReturnKind::EntityCollection,
        );
        let query = sql::lower(&descriptor);
        assert_eq!(
            query.text,
            "select * from posts where views=? order by title desc, views limit 3 offset 2"
        );
    }

    #[test]
    fn test_projected_selects() {
        let descriptor = derive(
            "findDistinctTitle",
            vec![],
            ReturnKind::Scalar(ColumnType::Text),
        );
        assert_eq!(sql::lower(&descriptor).text, "select distinct title from posts");

        let descriptor = derive(
            "findAvgViewsByTitle",
            params(&[("title", ColumnType::Text)]),
            ReturnKind::Scalar(ColumnType::Float64),
        );
        assert_eq!(
            sql::lower(&descriptor).text,
            "select avg(views) from posts where title=?"
        );
    }

    #[test]
    fn test_bare_find_has_no_where() {
        let descriptor = derive("find", vec![], ReturnKind::EntityCollection);
        assert_eq!(sql::lower(&descriptor).text, "select * from posts");
    }
}

mod documents {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_positional_pairing_exact_nesting() {
        // [A, And, B, Or, C] pairs positionally into And(A, Or(B, C)),
        // not the Or(And(A, B), C) that precedence would give
        let descriptor = derive(
            "findByIdAndTitleOrViews",
            params(&[
                ("id", ColumnType::Int64),
                ("title", ColumnType::Text),
                ("views", ColumnType::Int32),
            ]),
            ReturnKind::EntityCollection,
        );
        let DocumentQuery::Find { filter, .. } = document::lower(&descriptor) else {
            panic!("expected a find command");
        };
        assert_eq!(
            filter,
            Some(Filter::And(
                Box::new(eq_condition("id", "id")),
                Box::new(Filter::Or(
                    Box::new(eq_condition("title", "title")),
                    Box::new(eq_condition("views", "views")),
                )),
            ))
        );
    }

    #[test]
    fn test_four_condition_chain_nests_rightward() {
        let descriptor = derive(
            "findByIdOrTitleAndViewsOrId",
            params(&[
                ("id", ColumnType::Int64),
                ("title", ColumnType::Text),
                ("views", ColumnType::Int32),
                ("id2", ColumnType::Int64),
            ]),
            ReturnKind::EntityCollection,
        );
        let DocumentQuery::Find { filter, .. } = document::lower(&descriptor) else {
            panic!("expected a find command");
        };
        assert_eq!(
            filter,
            Some(Filter::Or(
                Box::new(eq_condition("id", "id")),
                Box::new(Filter::And(
                    Box::new(eq_condition("title", "title")),
                    Box::new(Filter::Or(
                        Box::new(eq_condition("views", "views")),
                        Box::new(eq_condition("id", "id2")),
                    )),
                )),
            ))
        );
    }

    #[test]
    fn test_filter_json_rendering() {
        let descriptor = derive(
            "findByIdAndTitleOrViews",
            params(&[
                ("id", ColumnType::Int64),
                ("title", ColumnType::Text),
                ("views", ColumnType::Int32),
            ]),
            ReturnKind::EntityCollection,
        );
        let command = document::lower(&descriptor).to_json("posts");
        assert_eq!(
            command,
            json!({
                "find": "posts",
                "filter": { "$and": [
                    { "id": { "$eq": { "$param": "id" } } },
                    { "$or": [
                        { "title": { "$eq": { "$param": "title" } } },
                        { "views": { "$eq": { "$param": "views" } } },
                    ] },
                ] },
            })
        );
    }

    #[test]
    fn test_null_keywords_render_against_null() {
        let descriptor = derive("findByTitleIsNotNull", vec![], ReturnKind::EntityCollection);
        let command = document::lower(&descriptor).to_json("posts");
        assert_eq!(
            command,
            json!({
                "find": "posts",
                "filter": { "title": { "$ne": null } },
            })
        );
    }

    #[test]
    fn test_exists_limits_to_one_document() {
        let descriptor = derive(
            "existsByTitle",
            params(&[("title", ColumnType::Text)]),
            ReturnKind::Boolean,
        );
        let command = document::lower(&descriptor).to_json("posts");
        assert_eq!(
            command,
            json!({
                "find": "posts",
                "filter": { "title": { "$eq": { "$param": "title" } } },
                "limit": 1,
            })
        );
    }

    #[test]
    fn test_find_with_sort_limit_skip() {
        let descriptor = derive(
            "findTop3Skip2ByViewsOrderByTitleDescAndViews",
            params(&[("views", ColumnType::Int32)]),
            ReturnKind::EntityCollection,
        );
        let DocumentQuery::Find {
            sort, limit, skip, ..
        } = document::lower(&descriptor)
        else {
            panic!("expected a find command");
        };
        assert_eq!(
            sort,
            vec![
                SortSpec { column: "title".into(), order: -1 },
                SortSpec { column: "views".into(), order: 1 },
            ]
        );
        assert_eq!(limit, Some(3));
        assert_eq!(skip, Some(2));
    }

    #[test]
    fn test_key_fallback_binds_entity_fields() {
        let descriptor = derive("delete", vec![Parameter::entity("post")], ReturnKind::Void);
        let command = document::lower(&descriptor).to_json("posts");
        assert_eq!(
            command,
            json!({
                "delete": "posts",
                "filter": { "id": { "$eq": { "$field": "id" } } },
            })
        );
    }

    #[test]
    fn test_update_set_rendering() {
        let descriptor = derive(
            "updateById",
            params(&[("id", ColumnType::Int64), ("title", ColumnType::Text)]),
            ReturnKind::Void,
        );
        let command = document::lower(&descriptor).to_json("posts");
        assert_eq!(
            command,
            json!({
                "update": "posts",
                "filter": { "id": { "$eq": { "$param": "id" } } },
                "set": { "title": { "$param": "title" } },
            })
        );
    }

    #[test]
    fn test_insert_carries_entity_parameter() {
        let descriptor = derive("insert", vec![Parameter::entity("post")], ReturnKind::Void);
        assert_eq!(
            document::lower(&descriptor),
            DocumentQuery::Insert { param: "post".into() }
        );
    }

    #[test]
    fn test_sql_and_document_agree_on_binding_order() {
        let descriptor = derive(
            "findByIdAndTitle",
            params(&[("id", ColumnType::Int64), ("title", ColumnType::Text)]),
            ReturnKind::Entity,
        );
        let relational = sql::lower(&descriptor);
        assert_eq!(
            relational.bindings,
            vec![
                Binding::Parameter("id".into()),
                Binding::Parameter("title".into()),
            ]
        );
        let DocumentQuery::Find { filter: Some(filter), .. } = document::lower(&descriptor) else {
            panic!("expected a filtered find");
        };
        assert_eq!(
            filter,
            Filter::And(
                Box::new(eq_condition("id", "id")),
                Box::new(eq_condition("title", "title")),
            )
        );
    }
}
