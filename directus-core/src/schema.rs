// directus-core/src/schema.rs
//! Collection and field metadata
//!
//! Field objects come from the `fields/<collection>` endpoint. Only the
//! properties the query engine and the CLI need are kept.
//!
//! # Architecture
//!
//! ```text
//! FieldCatalog trait (field existence for validation)
//!   └── Collection (fields loaded from the API or a JSON dump)
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{DirectusError, Result};
use crate::query::Query;
use crate::query_options::Selection;

/// Field metadata consumed by the query builder
///
/// Implementations are shared read-only between any number of queries.
pub trait FieldCatalog: Send + Sync {
    fn collection_name(&self) -> &str;

    fn field_exists(&self, name: &str) -> bool;
}

/// Storage type of a field, as reported by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Relational alias pointing to another collection
    Alias,
    Integer,
    BigInteger,
    String,
    Text,
    Boolean,
    Float,
    Decimal,
    Binary,
    Timestamp,
    DateTime,
    Date,
    Time,
    Json,
    Csv,
    Uuid,
    Hash,
    Other(String),
}

impl FieldType {
    /// Map an API type string; unknown types are kept as `Other`
    pub fn from_api_str(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "alias" => FieldType::Alias,
            "integer" => FieldType::Integer,
            "bigint" => FieldType::BigInteger,
            "string" | "character varying" => FieldType::String,
            "text" => FieldType::Text,
            "boolean" => FieldType::Boolean,
            "float" => FieldType::Float,
            "decimal" => FieldType::Decimal,
            "binary" => FieldType::Binary,
            "timestamp" => FieldType::Timestamp,
            "datetime" => FieldType::DateTime,
            "date" => FieldType::Date,
            "time" => FieldType::Time,
            "json" => FieldType::Json,
            "csv" => FieldType::Csv,
            "uuid" => FieldType::Uuid,
            "hash" => FieldType::Hash,
            other => FieldType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Alias => "alias",
            FieldType::Integer => "integer",
            FieldType::BigInteger => "bigint",
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Binary => "binary",
            FieldType::Timestamp => "timestamp",
            FieldType::DateTime => "datetime",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Json => "json",
            FieldType::Csv => "csv",
            FieldType::Uuid => "uuid",
            FieldType::Hash => "hash",
            FieldType::Other(other) => other,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::BigInteger | FieldType::Float | FieldType::Decimal
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
struct RawField {
    field: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    schema: Option<RawFieldSchema>,
    meta: Option<RawFieldMeta>,
}

#[derive(Deserialize, Default)]
struct RawFieldSchema {
    is_indexed: Option<bool>,
    is_unique: Option<bool>,
    is_nullable: Option<bool>,
    is_primary_key: Option<bool>,
    has_auto_increment: Option<bool>,
    max_length: Option<u64>,
}

#[derive(Deserialize, Default)]
struct RawFieldMeta {
    required: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub is_indexed: bool,
    pub is_unique: bool,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub has_auto_increment: bool,
    pub is_required: bool,
    pub max_length: Option<u64>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Field {
            name: name.into(),
            field_type,
            is_indexed: false,
            is_unique: false,
            is_nullable: false,
            is_primary_key: false,
            has_auto_increment: false,
            is_required: false,
            max_length: None,
        }
    }

    /// Parse one field object of the `fields/<collection>` response
    pub fn from_value(value: &Value) -> Result<Self> {
        let empty = match value {
            Value::Null => true,
            Value::Object(obj) => obj.is_empty(),
            _ => false,
        };
        if empty {
            return Err(DirectusError::InvalidMetadata("Field data is empty".to_string()));
        }

        let raw: RawField = serde_json::from_value(value.clone())
            .map_err(|e| DirectusError::InvalidMetadata(format!("Malformed field object: {}", e)))?;
        let schema = raw.schema.unwrap_or_default();
        let meta = raw.meta.unwrap_or_default();

        Ok(Field {
            name: raw.field,
            field_type: raw
                .kind
                .as_deref()
                .map(FieldType::from_api_str)
                .unwrap_or_else(|| FieldType::Other("unknown".to_string())),
            is_indexed: schema.is_indexed.unwrap_or(false),
            is_unique: schema.is_unique.unwrap_or(false),
            is_nullable: schema.is_nullable.unwrap_or(false),
            is_primary_key: schema.is_primary_key.unwrap_or(false),
            has_auto_increment: schema.has_auto_increment.unwrap_or(false),
            is_required: meta.required.unwrap_or(false),
            max_length: schema.max_length,
        })
    }
}

/// A named set of records and the fields they carry
#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    fields: Vec<Field>,
}

impl Collection {
    pub fn from_fields(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Collection {
            name: name.into(),
            fields,
        }
    }

    /// Build from a `fields/<collection>` response: a bare array or `{"data": [...]}`
    pub fn from_json(name: impl Into<String>, value: &Value) -> Result<Self> {
        let items = value
            .get("data")
            .unwrap_or(value)
            .as_array()
            .ok_or_else(|| {
                DirectusError::InvalidMetadata("fields response must be an array".to_string())
            })?;

        let fields = items.iter().map(Field::from_value).collect::<Result<Vec<_>>>()?;
        Ok(Collection::from_fields(name, fields))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Items endpoint of this collection
    pub fn endpoint(&self) -> String {
        format!("items/{}", self.name)
    }

    /// Start a query selecting `fields` (`["*"]` for all)
    pub fn query<I, S>(self: &Arc<Self>, fields: I) -> Result<Query>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let catalog: Arc<dyn FieldCatalog> = self.clone();
        let mut query = Query::new(catalog, self.endpoint());
        query.select(fields)?;
        Ok(query)
    }

    /// Start a query over every field
    pub fn query_all(self: &Arc<Self>) -> Query {
        Query::new(self.clone(), self.endpoint())
    }

    /// Query with an explicit selection, bypassing string parsing
    pub fn query_with(self: &Arc<Self>, selection: Selection) -> Result<Query> {
        match selection {
            Selection::All => Ok(self.query_all()),
            Selection::Fields(fields) => self.query(fields),
        }
    }
}

impl FieldCatalog for Collection {
    fn collection_name(&self) -> &str {
        &self.name
    }

    fn field_exists(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Collection {}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn books_fields() -> Value {
        json!({"data": [
            {"field": "id", "type": "integer",
             "schema": {"is_primary_key": true, "has_auto_increment": true, "is_nullable": false},
             "meta": {"required": false}},
            {"field": "title", "type": "string",
             "schema": {"max_length": 255, "is_indexed": true, "is_nullable": true},
             "meta": {"required": true}},
            {"field": "genres", "type": "csv", "schema": null, "meta": null},
            {"field": "author", "type": "alias"}
        ]})
    }

    #[test]
    fn test_field_type_mapping() {
        assert_eq!(FieldType::from_api_str("Character Varying"), FieldType::String);
        assert_eq!(FieldType::from_api_str("bigint"), FieldType::BigInteger);
        assert_eq!(FieldType::from_api_str("geometry"), FieldType::Other("geometry".to_string()));
        assert!(FieldType::Decimal.is_numeric());
        assert!(!FieldType::Csv.is_numeric());
        assert_eq!(FieldType::DateTime.to_string(), "datetime");
    }

    #[test]
    fn test_field_from_value() {
        let field = Field::from_value(&books_fields()["data"][1]).unwrap();
        assert_eq!(field.name, "title");
        assert_eq!(field.field_type, FieldType::String);
        assert!(field.is_indexed);
        assert!(field.is_nullable);
        assert!(field.is_required);
        assert!(!field.is_primary_key);
        assert_eq!(field.max_length, Some(255));
    }

    #[test]
    fn test_field_without_schema_or_meta() {
        let field = Field::from_value(&json!({"field": "genres", "type": "csv"})).unwrap();
        assert_eq!(field.field_type, FieldType::Csv);
        assert!(!field.is_required);
        assert_eq!(field.max_length, None);
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = Field::from_value(&json!({})).unwrap_err();
        assert!(matches!(err, DirectusError::InvalidMetadata(_)));
        assert!(Field::from_value(&json!({"type": "string"})).is_err());
    }

    #[test]
    fn test_collection_from_json() {
        let books = Collection::from_json("books", &books_fields()).unwrap();
        assert_eq!(books.name(), "books");
        assert_eq!(books.field_names(), vec!["id", "title", "genres", "author"]);
        assert!(books.field_exists("title"));
        assert!(!books.field_exists("not_found"));
        assert!(books.get_field("id").unwrap().is_primary_key);
        assert!(books.get_field("not_found").is_none());
        assert_eq!(books.endpoint(), "items/books");
        assert_eq!(books.to_string(), "<Collection books>");
    }

    #[test]
    fn test_collection_from_bare_array() {
        let bare = books_fields()["data"].clone();
        let books = Collection::from_json("books", &bare).unwrap();
        assert_eq!(books.fields().len(), 4);
        assert!(Collection::from_json("books", &json!({"data": {}})).is_err());
    }
}
