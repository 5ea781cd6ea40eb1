// src/query.rs
//! Query builder for one collection
//!
//! A [`Query`] accumulates a field selection, a filter tree, sort and
//! pagination, then either compiles into a request payload for a
//! [`QueryExecutor`] or renders itself for debugging:
//!
//! ```text
//! Query ──┬── to_dict()     wire JSON filter   (json.rs)
//!         ├── to_sql()      SQL-like text      (sql.rs)
//!         ├── describe()    English sentence   (english.rs)
//!         └── fetch()       payload → QueryExecutor → rows
//! ```
//!
//! Field names are validated against the shared [`FieldCatalog`] before
//! anything is recorded, so an unknown field never reaches the executor.
//!
//! # Examples
//!
//! ```ignore
//! let mut query = books.query(["title"])?;
//! query.filter("title")?.contains("Robots");
//! assert_eq!(query.to_dict(), json!({"title": {"_contains": "Robots"}}));
//! ```

pub mod builder;
pub mod english;
pub mod json;
pub mod operators;
pub mod sql;
pub mod tree;

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{DirectusError, Result};
use crate::executor::{QueryExecutor, Row};
use crate::query_options::{QueryOptions, Selection, SortDirection, SortSpec};
use crate::schema::FieldCatalog;

pub use builder::{ConditionBuilder, GroupBuilder};
pub use operators::{Logical, Operator, OperatorCategory};
pub use tree::{FieldCondition, FilterTree, LogicalGroup, Node, NodeId};

/// Query over one collection
///
/// Each query owns its filter tree; the field catalog is shared read-only, so
/// any number of queries can be built against the same collection at once.
#[derive(Clone)]
pub struct Query {
    catalog: Arc<dyn FieldCatalog>,
    endpoint: String,
    options: QueryOptions,
    tree: FilterTree,
}

impl Query {
    pub fn new(catalog: Arc<dyn FieldCatalog>, endpoint: impl Into<String>) -> Self {
        Query {
            catalog,
            endpoint: endpoint.into(),
            options: QueryOptions::default(),
            tree: FilterTree::new(),
        }
    }

    pub fn collection(&self) -> &str {
        self.catalog.collection_name()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn tree(&self) -> &FilterTree {
        &self.tree
    }

    /// Select output fields (`"*"` for all)
    ///
    /// Every name is validated first. Selecting also discards the current
    /// filter tree and invalidates its handles; sort and pagination are kept.
    pub fn select<I, S>(&mut self, fields: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selection = Selection::from_fields(fields);
        if let Some(names) = selection.fields() {
            for name in names {
                self.check_field(name, true)?;
            }
        }
        debug!(collection = self.collection(), fields = %selection.to_list(), "selection set, filter reset");
        self.options.selection = selection;
        self.tree.clear();
        Ok(self)
    }

    /// Start (or continue) the condition on `field`
    pub fn filter(&mut self, field: &str) -> Result<ConditionBuilder<'_>> {
        self.check_field(field, false)?;
        let id = self.tree.begin_condition(field);
        Ok(ConditionBuilder::new(self, id))
    }

    /// AND `nodes` with the current filter root
    ///
    /// An existing `_and` root absorbs `nodes` in place; its current children
    /// keep their order.
    pub fn and_(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> Result<GroupBuilder<'_>> {
        self.combine(Logical::And, nodes)
    }

    /// OR `nodes` with the current filter root
    pub fn or_(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> Result<GroupBuilder<'_>> {
        self.combine(Logical::Or, nodes)
    }

    /// Reopen a group built earlier, by handle
    pub fn group(&mut self, id: NodeId) -> Result<GroupBuilder<'_>> {
        let id = self.tree.resolve(id)?;
        if self.tree.group(id).is_none() {
            return Err(DirectusError::InvalidArgument(
                "handle does not refer to a logical group".to_string(),
            ));
        }
        Ok(GroupBuilder::new(self, id))
    }

    /// Sort by `field`, direction `"asc"` or `"desc"`
    pub fn sort(&mut self, field: &str, direction: &str) -> Result<&mut Self> {
        let direction: SortDirection = direction.parse()?;
        self.sort_by(field, direction)
    }

    pub fn sort_by(&mut self, field: &str, direction: SortDirection) -> Result<&mut Self> {
        self.check_field(field, false)?;
        self.options.sort = Some(SortSpec::new(field, direction));
        Ok(self)
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.options.limit = Some(limit);
        self
    }

    /// Select a 1-based result page
    pub fn page(&mut self, page: u64) -> Result<&mut Self> {
        if page == 0 {
            return Err(DirectusError::InvalidArgument(
                "page numbers start at 1".to_string(),
            ));
        }
        self.options.page = Some(page);
        Ok(self)
    }

    /// Wire JSON filter (`{}` when no clause is set)
    pub fn to_dict(&self) -> Value {
        json::to_dict(&self.tree)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_dict())?)
    }

    /// SQL-like text; WHERE is omitted when the filter is empty
    pub fn to_sql(&self) -> String {
        let mut lines = vec![
            format!("SELECT {}", self.options.selection.to_list()),
            format!("FROM {}", self.collection()),
        ];
        if let Some(clause) = sql::render_where(&self.tree) {
            lines.push(format!("WHERE {}", clause));
        }
        if let Some(sort) = &self.options.sort {
            lines.push(format!("ORDER BY {} {}", sort.field, sort.direction.as_sql()));
        }
        if let Some(limit) = self.options.limit {
            lines.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.options.offset() {
            lines.push(format!("OFFSET {}", offset));
        }
        lines.join("\n")
    }

    /// English sentence describing the query
    pub fn describe(&self) -> String {
        let clause = sql::render_where(&self.tree);
        english::describe(self.collection(), &self.options, clause.as_deref())
    }

    pub fn explanation(&self) -> Explanation {
        Explanation {
            json: serde_json::to_string_pretty(&self.to_dict()).unwrap_or_else(|e| e.to_string()),
            sql: self.to_sql(),
            english: self.describe(),
        }
    }

    /// Print JSON, SQL and English renderings to stdout
    pub fn explain(&self) {
        println!("{}", self.explanation());
    }

    /// Request payload handed to the executor
    pub fn payload(&self) -> Value {
        let filter = self.to_dict();
        let filter = match &filter {
            Value::Object(map) if map.is_empty() => None,
            _ => Some(filter),
        };
        self.options.to_payload(filter)
    }

    /// Execute through `executor`; with `display` the rows are echoed as JSON lines
    pub fn fetch(&self, executor: &dyn QueryExecutor, display: bool) -> Result<Vec<Row>> {
        let payload = self.payload();
        debug!(endpoint = %self.endpoint, payload = %payload, "executing query");

        let response = executor.execute(&self.endpoint, &payload);
        if !response.success {
            warn!(endpoint = %self.endpoint, error = %response.error_text, "query failed");
            return Err(DirectusError::RequestFailed(response.error_text));
        }

        debug!(endpoint = %self.endpoint, rows = response.rows.len(), "query succeeded");
        if display {
            for row in &response.rows {
                println!("{}", serde_json::to_string(row)?);
            }
        }
        Ok(response.rows)
    }

    fn combine(
        &mut self,
        logical: Logical,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Result<GroupBuilder<'_>> {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        let id = self.tree.combine(logical, &nodes)?;
        Ok(GroupBuilder::new(self, id))
    }

    // Only the part before the first '.' or ':' (nested path / alias) is checked,
    // verbatim: the name is sent exactly as given
    fn check_field(&self, field: &str, allow_wildcard: bool) -> Result<()> {
        let base = field
            .split(|c: char| c == '.' || c == ':')
            .next()
            .unwrap_or(field);
        if allow_wildcard && base == "*" {
            return Ok(());
        }
        if self.catalog.field_exists(base) {
            Ok(())
        } else {
            Err(DirectusError::field_not_found(self.collection(), base))
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("collection", &self.collection())
            .field("endpoint", &self.endpoint)
            .field("options", &self.options)
            .field("filter", &self.to_dict())
            .finish()
    }
}

/// The three debug renderings of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub json: String,
    pub sql: String,
    pub english: String,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- filter (wire JSON)")?;
        writeln!(f, "{}", self.json)?;
        writeln!(f, "-- SQL")?;
        writeln!(f, "{}", self.sql)?;
        writeln!(f, "-- description")?;
        write!(f, "{}", self.english)
    }
}

// ============================================================================
// TESTS
// ============================================================================
