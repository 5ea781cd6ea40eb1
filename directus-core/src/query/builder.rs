// src/query/builder.rs
//! Chainable builders returned by [`Query::filter`] and the AND/OR calls
//!
//! A builder borrows its query mutably, so handles ([`NodeId`]) are the way to
//! refer to conditions built in earlier statements:
//!
//! ```ignore
//! let rating = query.filter("rating")?.gte(3).id();
//! query.filter("genres")?.in_(vec!["Scifi", "Fantasy"]).and_([rating])?;
//! ```
//!
//! The per-operator methods (`eq`, `contains`, `between`, ...) are generated
//! from the operator catalog in `operators.rs`.

use serde_json::Value;
use tracing::warn;

use super::operators::{self, Logical, Operator};
use super::tree::NodeId;
use super::Query;
use crate::error::{DirectusError, Result};

/// Builder for one field condition
#[derive(Debug)]
pub struct ConditionBuilder<'q> {
    query: &'q mut Query,
    id: NodeId,
}

impl<'q> ConditionBuilder<'q> {
    pub(crate) fn new(query: &'q mut Query, id: NodeId) -> Self {
        ConditionBuilder { query, id }
    }

    /// Handle usable in later `and_`/`or_` calls
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn field(&self) -> &str {
        self.query
            .tree
            .condition(self.id)
            .map(|cond| cond.field())
            .unwrap_or_default()
    }

    pub(crate) fn apply_operator(self, operator: &'static Operator, value: impl Into<Value>) -> Self {
        if let Err(e) = self.query.tree.apply_operator(self.id, operator, value.into()) {
            warn!(operator = operator.symbol, error = %e, "operator not applied");
        }
        self
    }

    /// Apply an operator by fluent name (`"gte"`, `"in_"`, ...)
    pub fn apply(self, name: &str, value: impl Into<Value>) -> Result<Self> {
        let operator = operators::resolve(name)
            .ok_or_else(|| DirectusError::InvalidArgument(format!("unknown operator '{}'", name)))?;
        self.query.tree.apply_operator(self.id, operator, value.into())?;
        Ok(self)
    }

    /// AND this condition and `others` with the current filter root
    ///
    /// When the root is already an `_and` group, nodes that are already its
    /// children keep their place, so output follows the order in which fields
    /// were first filtered rather than the order of this call. [`Self::or_`]
    /// on an `_and` root wraps it instead, and appends in call order.
    pub fn and_(self, others: impl IntoIterator<Item = NodeId>) -> Result<GroupBuilder<'q>> {
        self.combine(Logical::And, others)
    }

    /// OR this condition and `others` with the current filter root
    pub fn or_(self, others: impl IntoIterator<Item = NodeId>) -> Result<GroupBuilder<'q>> {
        self.combine(Logical::Or, others)
    }

    /// Give the query back to continue chaining query-level calls
    pub fn done(self) -> &'q mut Query {
        self.query
    }

    fn combine(
        self,
        logical: Logical,
        others: impl IntoIterator<Item = NodeId>,
    ) -> Result<GroupBuilder<'q>> {
        let mut nodes = vec![self.id];
        nodes.extend(others);
        let id = self.query.tree.combine(logical, &nodes)?;
        Ok(GroupBuilder::new(self.query, id))
    }
}

/// Builder for a logical group inside the filter tree
#[derive(Debug)]
pub struct GroupBuilder<'q> {
    query: &'q mut Query,
    id: NodeId,
}

impl<'q> GroupBuilder<'q> {
    pub(crate) fn new(query: &'q mut Query, id: NodeId) -> Self {
        GroupBuilder { query, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn logical(&self) -> Option<Logical> {
        self.query.tree.group(self.id).map(|group| group.logical())
    }

    /// AND `nodes` inside this group (flattened when this group is `_and`)
    pub fn and_(self, nodes: impl IntoIterator<Item = NodeId>) -> Result<Self> {
        self.nest(Logical::And, nodes)
    }

    /// OR `nodes` inside this group (flattened when this group is `_or`)
    pub fn or_(self, nodes: impl IntoIterator<Item = NodeId>) -> Result<Self> {
        self.nest(Logical::Or, nodes)
    }

    /// Move one node into this group, merging or flattening as needed
    pub fn add(self, node: NodeId) -> Result<Self> {
        self.query.tree.add_child(self.id, node)?;
        Ok(self)
    }

    pub fn done(self) -> &'q mut Query {
        self.query
    }

    fn nest(self, logical: Logical, nodes: impl IntoIterator<Item = NodeId>) -> Result<Self> {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        let id = self.query.tree.nest(self.id, logical, &nodes)?;
        Ok(GroupBuilder::new(self.query, id))
    }
}
