// directus-core/src/lib.rs
// Pure Rust API - no transport, the executor seam owns all I/O

pub mod config;
pub mod error;
pub mod executor;
pub mod query;
pub mod query_options;
pub mod schema;

// Public exports
pub use config::DirectusConfig;
pub use error::{DirectusError, Result};
pub use executor::{ExecutionResponse, MemoryExecutor, QueryExecutor, Row};
pub use query::operators::{all_operators, resolve, resolve_symbol, CATALOG};
pub use query::{
    ConditionBuilder, Explanation, FilterTree, GroupBuilder, Logical, NodeId, Operator,
    OperatorCategory, Query,
};
pub use query_options::{QueryOptions, Selection, SortDirection, SortSpec};
pub use schema::{Collection, Field, FieldCatalog, FieldType};
