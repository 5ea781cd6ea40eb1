// src/query/sql.rs
//! SQL-like rendering of a filter tree, for explanations only
//!
//! The text approximates the filter: case-insensitive and negated string
//! operators share the `LIKE` shape of their base operator, and `_empty`
//! renders like `_null`. A clause whose value has the wrong shape is replaced
//! by an inline error message; the rest of the tree still renders.

use serde_json::Value;
use tracing::trace;

use super::operators::{Logical, Operator, SqlTemplate};
use super::tree::{FieldCondition, FilterTree, Node, NodeId};
use crate::error::{DirectusError, Result};

/// WHERE body for the whole tree, `None` when the filter is empty
pub fn render_where(tree: &FilterTree) -> Option<String> {
    let root = tree.root()?;
    let text = render_node(tree, root);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Render one node; empty string when the node carries no clause
pub fn render_node(tree: &FilterTree, id: NodeId) -> String {
    match tree.get(id) {
        Some(Node::Condition(cond)) => render_condition(cond),
        Some(Node::Group(group)) => {
            let parts: Vec<String> = group
                .children()
                .iter()
                .map(|child| render_node(tree, *child))
                .filter(|part| !part.is_empty())
                .collect();
            trace!(logical = group.logical().symbol(), parts = parts.len(), "rendered group");
            if parts.is_empty() {
                return String::new();
            }
            let joined = parts.join(group.logical().joiner());
            match group.logical() {
                Logical::And => joined,
                Logical::Or => format!("({})", joined),
            }
        }
        None => String::new(),
    }
}

/// All clauses of one field joined with AND
pub fn render_condition(cond: &FieldCondition) -> String {
    cond.operators()
        .iter()
        .map(|(op, value)| {
            render_clause(cond.field(), op, value).unwrap_or_else(|e| {
                format!(
                    "Error building SQL explanation for field '{}': {}",
                    cond.field(),
                    e
                )
            })
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// One `<field> <op> <value>` clause following the operator's template
pub fn render_clause(field: &str, op: &Operator, value: &Value) -> Result<String> {
    match op.sql {
        SqlTemplate::Binary(sql) => Ok(format!("{} {} {}", field, sql, literal(value))),
        SqlTemplate::Like(wildcard) => {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Ok(format!(
                "{} LIKE {}",
                field,
                quote(&wildcard.pattern(&text))
            ))
        }
        SqlTemplate::Between => match value {
            Value::Array(items) if items.len() == 2 => Ok(format!(
                "{} BETWEEN {} AND {}",
                field,
                literal(&items[0]),
                literal(&items[1])
            )),
            _ => Err(DirectusError::InvalidArgument(format!(
                "{} requires a list of exactly two values",
                op.symbol
            ))),
        },
        SqlTemplate::List(sql) => match value {
            Value::Array(items) => Ok(format!(
                "{} {} ({})",
                field,
                sql,
                items.iter().map(literal).collect::<Vec<_>>().join(", ")
            )),
            _ => Err(DirectusError::InvalidArgument(format!(
                "{} requires a list of values",
                op.symbol
            ))),
        },
        SqlTemplate::Predicate(sql) => Ok(format!("{} {}", field, sql)),
        SqlTemplate::Junction(_) => Err(DirectusError::InvalidArgument(format!(
            "logical operator {} has no field clause",
            op.symbol
        ))),
    }
}

/// SQL literal for a JSON value
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        other => other.to_string(),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::operators::all_operators;
    use serde_json::json;

    fn clause(op: &Operator, value: Value) -> String {
        render_clause("f", op, &value).unwrap()
    }

    #[test]
    fn test_binary_clauses() {
        assert_eq!(clause(&Operator::EQ, json!("x")), "f = 'x'");
        assert_eq!(clause(&Operator::NEQ, json!(1)), "f <> 1");
        assert_eq!(clause(&Operator::LT, json!(1.5)), "f < 1.5");
        assert_eq!(clause(&Operator::LTE, json!(2)), "f <= 2");
        assert_eq!(clause(&Operator::GT, json!(true)), "f > TRUE");
        assert_eq!(clause(&Operator::GTE, json!(3)), "f >= 3");
    }

    #[test]
    fn test_like_wildcards() {
        assert_eq!(clause(&Operator::CONTAINS, json!("Robots")), "f LIKE '%Robots%'");
        assert_eq!(clause(&Operator::NCONTAINS, json!("a")), "f LIKE '%a%'");
        assert_eq!(clause(&Operator::ISTARTS_WITH, json!("The")), "f LIKE 'The%'");
        assert_eq!(clause(&Operator::NISTARTS_WITH, json!("The")), "f LIKE 'The%'");
        assert_eq!(clause(&Operator::ENDS_WITH, json!("ing")), "f LIKE '%ing'");
        assert_eq!(clause(&Operator::NIENDS_WITH, json!("ing")), "f LIKE '%ing'");
        assert_eq!(clause(&Operator::CONTAINS, json!("it's")), "f LIKE '%it''s%'");
    }

    #[test]
    fn test_between() {
        assert_eq!(clause(&Operator::BETWEEN, json!([1, 5])), "f BETWEEN 1 AND 5");
        assert_eq!(clause(&Operator::NBETWEEN, json!(["a", "b"])), "f BETWEEN 'a' AND 'b'");
        let err = render_clause("f", &Operator::BETWEEN, &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, DirectusError::InvalidArgument(_)));
        assert!(render_clause("f", &Operator::BETWEEN, &json!(4)).is_err());
    }

    #[test]
    fn test_in_lists() {
        assert_eq!(
            clause(&Operator::IN, json!(["Scifi", "Fantasy"])),
            "f IN ('Scifi', 'Fantasy')"
        );
        assert_eq!(clause(&Operator::NIN, json!([1, 2])), "f NOT IN (1, 2)");
        let err = render_clause("f", &Operator::IN, &json!("Scifi")).unwrap_err();
        assert!(matches!(err, DirectusError::InvalidArgument(_)));
    }

    #[test]
    fn test_predicates_ignore_value() {
        assert_eq!(clause(&Operator::NULL, json!(true)), "f IS NULL");
        assert_eq!(clause(&Operator::EMPTY, json!(true)), "f IS NULL");
        assert_eq!(clause(&Operator::NNULL, json!(true)), "f IS NOT NULL");
        assert_eq!(clause(&Operator::NEMPTY, json!(true)), "f IS NOT NULL");
    }

    #[test]
    fn test_geometric_and_regex() {
        assert_eq!(clause(&Operator::REGEX, json!("^A")), "f REGEX '^A'");
        assert_eq!(
            clause(&Operator::NINTERSECTS_BBOX, json!({"type": "Point"})),
            "f NOT INTERSECTS_BBOX {\"type\":\"Point\"}"
        );
    }

    #[test]
    fn test_every_field_operator_renders() {
        for op in all_operators() {
            let value = match op.sql {
                SqlTemplate::Between => json!([1, 2]),
                SqlTemplate::List(_) => json!([1]),
                _ => json!("v"),
            };
            assert!(render_clause("f", op, &value).is_ok(), "{}", op.symbol);
        }
    }

    #[test]
    fn test_bad_clause_is_isolated() {
        let mut tree = FilterTree::new();
        let year = tree.begin_condition("year");
        tree.apply_operator(year, &Operator::BETWEEN, json!([1, 2, 3])).unwrap();
        tree.apply_operator(year, &Operator::LT, json!(2020)).unwrap();
        let title = tree.begin_condition("title");
        tree.apply_operator(title, &Operator::EQ, json!("Dune")).unwrap();

        let text = render_where(&tree).unwrap();
        assert!(text.starts_with("Error building SQL explanation for field 'year':"));
        assert!(text.ends_with(" AND year < 2020 AND title = 'Dune'"));
    }

    #[test]
    fn test_or_groups_are_parenthesized() {
        let mut tree = FilterTree::new();
        let title = tree.begin_condition("title");
        tree.apply_operator(title, &Operator::CONTAINS, json!("Robots")).unwrap();
        let rating = tree.begin_condition("rating");
        tree.apply_operator(rating, &Operator::GTE, json!(3)).unwrap();
        let genres = tree.begin_condition("genres");
        tree.apply_operator(genres, &Operator::IN, json!(["Scifi", "Fantasy"])).unwrap();
        tree.combine(Logical::Or, &[genres]).unwrap();

        assert_eq!(
            render_where(&tree).unwrap(),
            "(title LIKE '%Robots%' AND rating >= 3 OR genres IN ('Scifi', 'Fantasy'))"
        );
    }

    #[test]
    fn test_empty_tree_has_no_where() {
        let mut tree = FilterTree::new();
        assert_eq!(render_where(&tree), None);
        tree.begin_condition("title");
        assert_eq!(render_where(&tree), None);
    }
}
