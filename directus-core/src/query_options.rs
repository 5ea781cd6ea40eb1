// directus-core/src/query_options.rs
// Query options: field selection, sort, limit, page

use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{DirectusError, Result};

/// Output fields of a query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// `*`: every field
    #[default]
    All,
    Fields(Vec<String>),
}

impl Selection {
    /// Build a selection from field names; `*` anywhere (or no names) selects all
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = Vec::new();
        for field in fields {
            let field = field.as_ref().trim();
            if field == "*" {
                return Selection::All;
            }
            if !field.is_empty() {
                names.push(field.to_string());
            }
        }
        if names.is_empty() {
            Selection::All
        } else {
            Selection::Fields(names)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn fields(&self) -> Option<&[String]> {
        match self {
            Selection::All => None,
            Selection::Fields(fields) => Some(fields),
        }
    }

    /// Comma separated list, `*` for all
    pub fn to_list(&self) -> String {
        match self {
            Selection::All => "*".to_string(),
            Selection::Fields(fields) => fields.join(", "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = DirectusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(DirectusError::InvalidArgument(format!(
                "sort direction must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        SortSpec {
            field: field.into(),
            direction,
        }
    }

    /// Wire form: `field` ascending, `-field` descending
    pub fn to_wire(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("-{}", self.field),
        }
    }
}

/// Everything a query carries besides its filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub selection: Selection,
    pub sort: Option<SortSpec>,
    pub limit: Option<u64>,
    /// 1-based page number
    pub page: Option<u64>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Rows skipped before the requested page, when both limit and page are set
    pub fn offset(&self) -> Option<u64> {
        match (self.limit, self.page) {
            (Some(limit), Some(page)) if page > 1 => Some(limit.saturating_mul(page - 1)),
            _ => None,
        }
    }

    /// Compile the request payload; unset keys are omitted
    pub fn to_payload(&self, filter: Option<Value>) -> Value {
        let mut query = Map::new();
        if let Some(fields) = self.selection.fields() {
            query.insert("fields".to_string(), json!(fields));
        }
        if let Some(limit) = self.limit {
            query.insert("limit".to_string(), json!(limit));
        }
        if let Some(sort) = &self.sort {
            query.insert("sort".to_string(), json!(sort.to_wire()));
        }
        if let Some(page) = self.page {
            query.insert("page".to_string(), json!(page));
        }
        if let Some(filter) = filter {
            query.insert("filter".to_string(), filter);
        }
        json!({ "query": Value::Object(query) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_from_fields() {
        assert_eq!(
            Selection::from_fields(["title", "rating"]),
            Selection::Fields(vec!["title".to_string(), "rating".to_string()])
        );
        assert_eq!(Selection::from_fields(["title", "*"]), Selection::All);
        assert_eq!(Selection::from_fields(Vec::<String>::new()), Selection::All);
        assert_eq!(Selection::from_fields(["title"]).to_list(), "title");
        assert_eq!(Selection::All.to_list(), "*");
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        let err = "up".parse::<SortDirection>().unwrap_err();
        assert!(matches!(err, DirectusError::InvalidArgument(_)));
    }

    #[test]
    fn test_sort_wire_form() {
        assert_eq!(SortSpec::new("rating", SortDirection::Asc).to_wire(), "rating");
        assert_eq!(SortSpec::new("rating", SortDirection::Desc).to_wire(), "-rating");
    }

    #[test]
    fn test_offset() {
        let opts = QueryOptions::new().with_limit(20).with_page(3);
        assert_eq!(opts.offset(), Some(40));
        assert_eq!(QueryOptions::new().with_limit(20).with_page(1).offset(), None);
        assert_eq!(QueryOptions::new().with_page(3).offset(), None);
    }

    #[test]
    fn test_offset_saturates_on_huge_limit() {
        let opts = QueryOptions::new().with_limit(u64::MAX).with_page(3);
        assert_eq!(opts.offset(), Some(u64::MAX));
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(QueryOptions::new().to_payload(None), json!({"query": {}}));
    }

    #[test]
    fn test_full_payload() {
        let opts = QueryOptions::new()
            .with_selection(Selection::from_fields(["title"]))
            .with_sort(SortSpec::new("rating", SortDirection::Desc))
            .with_limit(5)
            .with_page(2);
        let payload = opts.to_payload(Some(json!({"title": {"_contains": "Robots"}})));
        assert_eq!(
            payload,
            json!({"query": {
                "fields": ["title"],
                "limit": 5,
                "sort": "-rating",
                "page": 2,
                "filter": {"title": {"_contains": "Robots"}}
            }})
        );
        let keys: Vec<_> = payload["query"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["fields", "limit", "sort", "page", "filter"]);
    }
}
