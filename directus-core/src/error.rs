// directus-core/src/error.rs
// Error types shared by the query engine, metadata loading and the executor seam

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DirectusError {
    /// A field referenced by select/filter/sort is not part of the collection
    #[error("Field '{field}' not found in collection '{collection}'")]
    FieldNotFound { collection: String, field: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The execution collaborator reported a non-success response
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DirectusError>;

impl DirectusError {
    pub fn field_not_found(collection: &str, field: &str) -> Self {
        DirectusError::FieldNotFound {
            collection: collection.to_string(),
            field: field.to_string(),
        }
    }
}
