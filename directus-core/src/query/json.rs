// src/query/json.rs
//! Wire JSON rendering of a filter tree
//!
//! ```json
//! {"_and": [{"title": {"_contains": "Robots"}}, {"rating": {"_gte": 3}}]}
//! ```
//!
//! Conditions without operators and groups without rendered children are
//! skipped at every level, so the output never contains `{}` placeholders.

use serde_json::{Map, Value};

use super::tree::{FieldCondition, FilterTree, Node, NodeId};

/// Filter mapping for the whole tree (`{}` when nothing is set)
pub fn to_dict(tree: &FilterTree) -> Value {
    tree.root()
        .and_then(|root| node_to_value(tree, root))
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Rendered node, or `None` when it carries no clause
pub fn node_to_value(tree: &FilterTree, id: NodeId) -> Option<Value> {
    match tree.get(id)? {
        Node::Condition(cond) => condition_to_value(cond),
        Node::Group(group) => {
            let children: Vec<Value> = group
                .children()
                .iter()
                .filter_map(|child| node_to_value(tree, *child))
                .collect();
            if children.is_empty() {
                return None;
            }
            let mut map = Map::new();
            map.insert(group.logical().symbol().to_string(), Value::Array(children));
            Some(Value::Object(map))
        }
    }
}

pub fn condition_to_value(cond: &FieldCondition) -> Option<Value> {
    if cond.is_empty() {
        return None;
    }
    let operators: Map<String, Value> = cond
        .operators()
        .iter()
        .map(|(op, value)| (op.symbol.to_string(), value.clone()))
        .collect();
    let mut map = Map::new();
    map.insert(cond.field().to_string(), Value::Object(operators));
    Some(Value::Object(map))
}
