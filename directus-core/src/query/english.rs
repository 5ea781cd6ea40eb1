// src/query/english.rs
//! English-like description of a query
//!
//! `Fetching 10 items from books for page 2 sorted by rating desc where rating >= 3`

use crate::query_options::QueryOptions;

/// Sentence describing what a query will fetch
///
/// `where_clause` is the SQL-style WHERE body, if any.
pub fn describe(collection: &str, options: &QueryOptions, where_clause: Option<&str>) -> String {
    let mut parts: Vec<String> = vec!["Fetching".to_string()];

    match (options.selection.fields(), options.limit) {
        (Some(fields), Some(limit)) => {
            parts.push(fields.join(", "));
            parts.push(format!("of {} items", limit));
        }
        (Some(fields), None) => parts.push(fields.join(", ")),
        (None, Some(limit)) => parts.push(format!("{} items", limit)),
        (None, None) => parts.push("items".to_string()),
    }

    parts.push(format!("from {}", collection));

    if let Some(page) = options.page {
        parts.push(format!("for page {}", page));
    }
    if let Some(sort) = &options.sort {
        parts.push(format!("sorted by {} {}", sort.field, sort.direction));
    }
    if let Some(clause) = where_clause {
        parts.push(format!("where {}", clause));
    }

    collapse_spaces(&parts.join(" "))
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;
    for c in text.trim().chars() {
        if c == ' ' {
            if previous_space {
                continue;
            }
            previous_space = true;
        } else {
            previous_space = false;
        }
        out.push(c);
    }
    out
}
