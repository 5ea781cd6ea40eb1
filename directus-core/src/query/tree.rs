// src/query/tree.rs
//! Filter expression tree
//!
//! Nodes live in an arena owned by [`FilterTree`] and are addressed by
//! [`NodeId`]. Moving a node between groups, merging two conditions on the
//! same field and flattening same-operator groups are all index rewrites:
//!
//! ```text
//! slots: [ cond(title) | cond(rating) | group(_and: [0, 1]) ]
//! root:  2
//! ```
//!
//! A node belongs to at most one group at a time. Adding a node to another
//! group detaches it from its previous parent. A node that disappears through
//! a merge or a flatten keeps a forward pointer to the node that absorbed it,
//! so handles obtained earlier keep working.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::operators::{Logical, Operator};
use crate::error::{DirectusError, Result};

/// Handle to a node of one [`FilterTree`]
///
/// Handles are invalidated by [`FilterTree::clear`] and are only valid on the
/// tree that issued them; using one anywhere else fails with `InvalidArgument`
/// instead of addressing an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    tree: u64,
    index: usize,
    epoch: u32,
}

// Process-wide source of tree ids
static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

fn next_tree_id() -> u64 {
    NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed)
}

/// One field bound to an ordered set of (operator, value) pairs
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    field: String,
    operators: Vec<(&'static Operator, Value)>,
}

impl FieldCondition {
    pub fn new(field: impl Into<String>) -> Self {
        FieldCondition {
            field: field.into(),
            operators: Vec::new(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Operators in the order they were first applied
    pub fn operators(&self) -> &[(&'static Operator, Value)] {
        &self.operators
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&Value> {
        self.operators
            .iter()
            .find(|(op, _)| op.symbol == symbol)
            .map(|(_, value)| value)
    }

    /// Set an operator; a repeated operator replaces its value in place
    pub fn set(&mut self, operator: &'static Operator, value: Value) {
        match self.operators.iter_mut().find(|(op, _)| *op == operator) {
            Some(slot) => slot.1 = value,
            None => self.operators.push((operator, value)),
        }
    }

    fn merge_from(&mut self, other: Vec<(&'static Operator, Value)>) {
        for (operator, value) in other {
            self.set(operator, value);
        }
    }
}

/// AND/OR over an ordered list of child nodes
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalGroup {
    logical: Logical,
    children: Vec<NodeId>,
}

impl LogicalGroup {
    pub fn logical(&self) -> Logical {
        self.logical
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Condition(FieldCondition),
    Group(LogicalGroup),
}

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    parent: Option<NodeId>,
    forward: Option<NodeId>,
}

/// Arena of filter nodes
///
/// Every tree carries a process-unique id stamped into the handles it issues.
/// A clone gets a fresh id: the copies diverge from then on, so handles taken
/// from one are rejected by the other.
#[derive(Debug)]
pub struct FilterTree {
    id: u64,
    slots: Vec<Slot>,
    root: Option<NodeId>,
    epoch: u32,
}

impl Default for FilterTree {
    fn default() -> Self {
        FilterTree {
            id: next_tree_id(),
            slots: Vec::new(),
            root: None,
            epoch: 0,
        }
    }
}

impl Clone for FilterTree {
    fn clone(&self) -> Self {
        let id = next_tree_id();
        let restamp = |node: NodeId| NodeId { tree: id, ..node };
        let slots = self
            .slots
            .iter()
            .map(|slot| Slot {
                node: match &slot.node {
                    Node::Group(group) => Node::Group(LogicalGroup {
                        logical: group.logical,
                        children: group.children.iter().copied().map(restamp).collect(),
                    }),
                    Node::Condition(cond) => Node::Condition(cond.clone()),
                },
                parent: slot.parent.map(restamp),
                forward: slot.forward.map(restamp),
            })
            .collect();
        FilterTree {
            id,
            slots,
            root: self.root.map(restamp),
            epoch: self.epoch,
        }
    }
}

impl FilterTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// True when no filter has been started
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Drop every node; outstanding handles become stale
    pub fn clear(&mut self) {
        self.slots.clear();
        self.root = None;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Follow merge/flatten forwards to the live node
    pub fn resolve(&self, id: NodeId) -> Result<NodeId> {
        let mut current = self.check(id)?;
        while let Some(next) = self.slots[current.index].forward {
            current = next;
        }
        Ok(current)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let id = self.resolve(id).ok()?;
        Some(&self.slots[id.index].node)
    }

    pub fn condition(&self, id: NodeId) -> Option<&FieldCondition> {
        match self.get(id)? {
            Node::Condition(cond) => Some(cond),
            Node::Group(_) => None,
        }
    }

    pub fn group(&self, id: NodeId) -> Option<&LogicalGroup> {
        match self.get(id)? {
            Node::Group(group) => Some(group),
            Node::Condition(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let id = self.resolve(id).ok()?;
        self.slots[id.index].parent
    }

    /// Condition for `field` at the top level of the tree, creating it if needed
    ///
    /// - empty tree: the new condition becomes the root, without a wrapper
    /// - root condition on the same field: that condition is returned
    /// - root condition on another field: the root becomes `_and` of both
    /// - root group: an existing direct child for `field` is reused,
    ///   otherwise the new condition is appended to the group
    pub fn begin_condition(&mut self, field: &str) -> NodeId {
        let Some(root) = self.root else {
            let id = self.alloc(Node::Condition(FieldCondition::new(field)));
            self.root = Some(id);
            debug!(field, "filter root set to condition");
            return id;
        };

        match &self.slots[root.index].node {
            Node::Condition(cond) if cond.field == field => root,
            Node::Condition(_) => {
                let id = self.alloc(Node::Condition(FieldCondition::new(field)));
                let group = self.alloc(Node::Group(LogicalGroup {
                    logical: Logical::And,
                    children: Vec::new(),
                }));
                self.attach(group, root);
                self.attach(group, id);
                self.root = Some(group);
                debug!(field, "filter root promoted to _and group");
                id
            }
            Node::Group(_) => {
                if let Some(existing) = self.find_condition(root, field) {
                    return existing;
                }
                let id = self.alloc(Node::Condition(FieldCondition::new(field)));
                self.attach(root, id);
                id
            }
        }
    }

    /// Set `operator` on a condition node, replacing a previous value
    pub fn apply_operator(
        &mut self,
        id: NodeId,
        operator: &'static Operator,
        value: Value,
    ) -> Result<()> {
        if operator.is_logical() {
            return Err(DirectusError::InvalidArgument(format!(
                "logical operator '{}' cannot be applied to a field",
                operator.symbol
            )));
        }
        let id = self.resolve(id)?;
        match &mut self.slots[id.index].node {
            Node::Condition(cond) => {
                cond.set(operator, value);
                Ok(())
            }
            Node::Group(_) => Err(DirectusError::InvalidArgument(
                "operators can only be applied to field conditions".to_string(),
            )),
        }
    }

    /// Combine the current root with `nodes` under `logical`
    ///
    /// A root group with the same operator absorbs the nodes directly;
    /// anything else is wrapped in a new group whose first child is the old
    /// root. Passing the root itself among `nodes` is a no-op for that entry.
    pub fn combine(&mut self, logical: Logical, nodes: &[NodeId]) -> Result<NodeId> {
        let nodes = self.resolve_all(nodes)?;
        let nodes: Vec<NodeId> = nodes
            .into_iter()
            .filter(|id| Some(*id) != self.root)
            .collect();

        if let Some(root) = self.root {
            if let Node::Group(group) = &self.slots[root.index].node {
                if group.logical == logical {
                    for id in nodes {
                        self.add_child(root, id)?;
                    }
                    return Ok(root);
                }
            }
        }

        let group = self.alloc(Node::Group(LogicalGroup {
            logical,
            children: Vec::new(),
        }));
        if let Some(root) = self.root {
            self.attach(group, root);
        }
        for id in nodes {
            self.add_child(group, id)?;
        }
        self.root = Some(group);
        debug!(logical = logical.symbol(), "filter root wrapped in new group");
        Ok(group)
    }

    /// Combine `nodes` inside an existing group
    ///
    /// Same operator: the nodes are added to `group`. Different operator: a
    /// new sub-group holding the nodes is appended to `group`.
    pub fn nest(&mut self, group: NodeId, logical: Logical, nodes: &[NodeId]) -> Result<NodeId> {
        let group = self.resolve(group)?;
        let target = self.group_logical(group)?;
        let nodes = self.resolve_all(nodes)?;
        for id in &nodes {
            self.ensure_not_ancestor(*id, group)?;
        }

        if target == logical {
            for id in nodes {
                self.add_child(group, id)?;
            }
        } else {
            let sub = self.alloc(Node::Group(LogicalGroup {
                logical,
                children: Vec::new(),
            }));
            for id in nodes {
                self.add_child(sub, id)?;
            }
            self.add_child(group, sub)?;
        }
        Ok(group)
    }

    /// Add `node` to `group` applying the flatten and field-merge rules
    pub fn add_child(&mut self, group: NodeId, node: NodeId) -> Result<()> {
        let group = self.resolve(group)?;
        let node = self.resolve(node)?;
        let target = self.group_logical(group)?;
        self.ensure_not_ancestor(node, group)?;

        if self.slots[node.index].parent == Some(group) {
            return Ok(());
        }

        match &self.slots[node.index].node {
            Node::Group(inner) if inner.logical == target => {
                let children = inner.children.clone();
                for child in children {
                    self.add_child(group, child)?;
                }
                self.retire(node, group);
                debug!(logical = target.symbol(), "flattened nested group");
            }
            Node::Condition(cond) => match self.find_condition(group, &cond.field) {
                Some(existing) => {
                    let operators = match &mut self.slots[node.index].node {
                        Node::Condition(cond) => std::mem::take(&mut cond.operators),
                        Node::Group(_) => Vec::new(),
                    };
                    if let Node::Condition(survivor) = &mut self.slots[existing.index].node {
                        debug!(field = %survivor.field, "merged condition into sibling");
                        survivor.merge_from(operators);
                    }
                    self.retire(node, existing);
                }
                None => self.attach(group, node),
            },
            Node::Group(_) => self.attach(group, node),
        }
        Ok(())
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId {
            tree: self.id,
            index: self.slots.len(),
            epoch: self.epoch,
        };
        self.slots.push(Slot {
            node,
            parent: None,
            forward: None,
        });
        id
    }

    fn check(&self, id: NodeId) -> Result<NodeId> {
        if id.tree != self.id {
            return Err(DirectusError::InvalidArgument(
                "filter node handle belongs to another query".to_string(),
            ));
        }
        if id.epoch != self.epoch || id.index >= self.slots.len() {
            return Err(DirectusError::InvalidArgument(
                "stale filter node handle".to_string(),
            ));
        }
        Ok(id)
    }

    fn resolve_all(&self, ids: &[NodeId]) -> Result<Vec<NodeId>> {
        ids.iter().map(|id| self.resolve(*id)).collect()
    }

    fn group_logical(&self, id: NodeId) -> Result<Logical> {
        match &self.slots[id.index].node {
            Node::Group(group) => Ok(group.logical),
            Node::Condition(_) => Err(DirectusError::InvalidArgument(
                "target node is a field condition, not a logical group".to_string(),
            )),
        }
    }

    fn find_condition(&self, group: NodeId, field: &str) -> Option<NodeId> {
        let Node::Group(g) = &self.slots[group.index].node else {
            return None;
        };
        g.children.iter().copied().find(|child| {
            matches!(&self.slots[child.index].node, Node::Condition(c) if c.field == field)
        })
    }

    fn ensure_not_ancestor(&self, node: NodeId, group: NodeId) -> Result<()> {
        let mut current = Some(group);
        while let Some(id) = current {
            if id == node {
                return Err(DirectusError::InvalidArgument(
                    "a group cannot contain itself".to_string(),
                ));
            }
            current = self.slots[id.index].parent;
        }
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        match self.slots[node.index].parent.take() {
            Some(parent) => {
                if let Node::Group(group) = &mut self.slots[parent.index].node {
                    group.children.retain(|child| *child != node);
                }
            }
            None => {
                if self.root == Some(node) {
                    self.root = None;
                }
            }
        }
    }

    fn attach(&mut self, group: NodeId, node: NodeId) {
        self.detach(node);
        if let Node::Group(g) = &mut self.slots[group.index].node {
            g.children.push(node);
        }
        self.slots[node.index].parent = Some(group);
    }

    fn retire(&mut self, node: NodeId, into: NodeId) {
        self.detach(node);
        self.slots[node.index].forward = Some(into);
    }
}
