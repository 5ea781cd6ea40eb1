// directus-core/src/executor.rs
//! Execution collaborator seam
//!
//! The query engine never performs I/O itself. A compiled payload is handed to
//! a [`QueryExecutor`], which owns transport, authentication and retries.
//!
//! ```text
//! QueryExecutor trait
//!   ├── MemoryExecutor (testing/offline, canned response + call log)
//!   └── HTTP session (outside this crate)
//! ```

use parking_lot::Mutex;
use serde_json::{Map, Value};

/// One record returned by the API
pub type Row = Map<String, Value>;

/// Outcome reported by an executor
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResponse {
    pub success: bool,
    pub rows: Vec<Row>,
    pub error_text: String,
}

impl ExecutionResponse {
    pub fn ok(rows: Vec<Row>) -> Self {
        ExecutionResponse {
            success: true,
            rows,
            error_text: String::new(),
        }
    }

    pub fn failed(error_text: impl Into<String>) -> Self {
        ExecutionResponse {
            success: false,
            rows: Vec::new(),
            error_text: error_text.into(),
        }
    }
}

pub trait QueryExecutor: Send + Sync {
    /// Run `payload` against `endpoint` (e.g. `items/books`)
    fn execute(&self, endpoint: &str, payload: &Value) -> ExecutionResponse;
}

/// In-memory executor returning a fixed response
///
/// Every call is recorded so tests can check what was sent, or that nothing was.
pub struct MemoryExecutor {
    response: ExecutionResponse,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MemoryExecutor {
    pub fn new(response: ExecutionResponse) -> Self {
        MemoryExecutor {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Executor answering with `rows`; non-object rows are skipped
    pub fn with_rows(rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        Self::new(ExecutionResponse::ok(rows))
    }

    pub fn failing(error_text: impl Into<String>) -> Self {
        Self::new(ExecutionResponse::failed(error_text))
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl QueryExecutor for MemoryExecutor {
    fn execute(&self, endpoint: &str, payload: &Value) -> ExecutionResponse {
        self.calls.lock().push((endpoint.to_string(), payload.clone()));
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_executor_records_calls() {
        let exec = MemoryExecutor::with_rows(vec![json!({"id": 1}), json!("skipped")]);
        let response = exec.execute("items/books", &json!({"query": {}}));
        assert!(response.success);
        assert_eq!(response.rows.len(), 1);
        assert_eq!(exec.call_count(), 1);
        assert_eq!(exec.calls()[0].0, "items/books");
    }

    #[test]
    fn test_failing_executor() {
        let exec = MemoryExecutor::failing("403 Forbidden");
        let response = exec.execute("items/books", &json!({}));
        assert!(!response.success);
        assert!(response.rows.is_empty());
        assert_eq!(response.error_text, "403 Forbidden");
    }
}
