use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use directus_core::{Collection, DirectusConfig, NodeId, Query};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(name = "directus")]
#[command(about = "Directus query CLI - build, inspect and explain collection queries offline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the fields of a collection
    Fields {
        /// Fields dump (`fields/<collection>` response) as JSON
        #[arg(long)]
        schema: PathBuf,
        /// Collection name
        #[arg(long)]
        collection: String,
    },
    /// Print the JSON, SQL and English renderings of a query
    Explain(QueryArgs),
    /// Print the wire JSON filter
    Json(QueryArgs),
    /// Print the SQL-like rendering
    Sql(QueryArgs),
    /// Print the request payload (and target URL when configured)
    Payload(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Fields dump (`fields/<collection>` response) as JSON
    #[arg(long)]
    schema: PathBuf,
    /// Collection name
    #[arg(long)]
    collection: String,
    /// Comma separated output fields (default: all)
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,
    /// Condition `field:operator:value`; the value is parsed as JSON when possible
    #[arg(long = "where", value_name = "FIELD:OP:VALUE")]
    conditions: Vec<String>,
    /// Combine conditions with OR instead of AND
    #[arg(long)]
    any: bool,
    /// Sort as `field` or `field:asc|desc`
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    limit: Option<u64>,
    /// 1-based page number
    #[arg(long)]
    page: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fields { schema, collection } => list_fields(&schema, &collection),
        Commands::Explain(args) => {
            build_query(&args)?.explain();
            Ok(())
        }
        Commands::Json(args) => {
            println!("{}", build_query(&args)?.to_json()?);
            Ok(())
        }
        Commands::Sql(args) => {
            println!("{}", build_query(&args)?.to_sql());
            Ok(())
        }
        Commands::Payload(args) => print_payload(&args),
    }
}

/// Load a collection from a fields dump
fn load_collection(path: &Path, name: &str) -> Result<Arc<Collection>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in file: {}", path.display()))?;

    let collection = Collection::from_json(name, &value)
        .with_context(|| format!("Invalid fields dump: {}", path.display()))?;

    debug!(collection = name, fields = collection.fields().len(), "collection loaded");
    Ok(Arc::new(collection))
}

fn list_fields(path: &Path, name: &str) -> Result<()> {
    let collection = load_collection(path, name)?;

    println!("{}", collection);
    for field in collection.fields() {
        let mut flags = Vec::new();
        if field.is_primary_key {
            flags.push("primary key");
        }
        if field.is_required {
            flags.push("required");
        }
        if field.is_nullable {
            flags.push("nullable");
        }
        if flags.is_empty() {
            println!("  {:<24} {}", field.name, field.field_type);
        } else {
            println!("  {:<24} {} ({})", field.name, field.field_type, flags.join(", "));
        }
    }

    println!("Total: {} fields", collection.fields().len());
    Ok(())
}

/// Build a query from command-line arguments
fn build_query(args: &QueryArgs) -> Result<Query> {
    let collection = load_collection(&args.schema, &args.collection)?;

    let mut query = if args.select.is_empty() {
        collection.query_all()
    } else {
        collection
            .query(&args.select)
            .context("Invalid --select")?
    };

    let mut nodes: Vec<NodeId> = Vec::new();
    for raw in &args.conditions {
        let (field, operator, value) = parse_condition(raw)?;
        let id = query
            .filter(field)
            .with_context(|| format!("Invalid --where '{}'", raw))?
            .apply(operator, value)
            .with_context(|| format!("Invalid --where '{}'", raw))?
            .id();
        nodes.push(id);
    }
    if args.any && nodes.len() > 1 {
        query.or_(nodes).context("Failed to combine conditions")?;
    }

    if let Some(raw) = &args.sort {
        let (field, direction) = parse_sort(raw);
        query
            .sort(field, direction)
            .with_context(|| format!("Invalid --sort '{}'", raw))?;
    }
    if let Some(limit) = args.limit {
        query.limit(limit);
    }
    if let Some(page) = args.page {
        query.page(page).context("Invalid --page")?;
    }

    Ok(query)
}

fn print_payload(args: &QueryArgs) -> Result<()> {
    let query = build_query(args)?;

    match DirectusConfig::from_env() {
        Ok(config) => {
            let endpoint = config.endpoint_for(query.collection());
            println!("Target: {}", config.url_for(&endpoint));
        }
        Err(e) => debug!(error = %e, "no API configuration, printing payload only"),
    }

    let json = serde_json::to_string_pretty(&query.payload())
        .with_context(|| "Failed to serialize payload")?;
    println!("{}", json);
    Ok(())
}

/// Split `field:operator:value`; the value is JSON or else a plain string
fn parse_condition(raw: &str) -> Result<(&str, &str, Value)> {
    let mut parts = raw.splitn(3, ':');
    let field = parts.next().map(str::trim).unwrap_or_default();
    let operator = parts.next().map(str::trim).unwrap_or_default();
    if field.is_empty() || operator.is_empty() {
        anyhow::bail!("Condition must look like field:operator[:value], got '{}'", raw);
    }

    let value = match parts.next() {
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
        None => Value::Bool(true),
    };
    Ok((field, operator, value))
}

/// Split `field[:direction]`, ascending by default
fn parse_sort(raw: &str) -> (&str, &str) {
    match raw.split_once(':') {
        Some((field, direction)) => (field.trim(), direction.trim()),
        None => (raw.trim(), "asc"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn args(dir: &TempDir) -> QueryArgs {
        let schema = dir.path().join("books.json");
        let dump = json!({"data": [
            {"field": "title", "type": "string"},
            {"field": "rating", "type": "integer"},
            {"field": "year", "type": "integer"}
        ]});
        fs::write(&schema, dump.to_string()).unwrap();
        QueryArgs {
            schema,
            collection: "books".to_string(),
            select: Vec::new(),
            conditions: Vec::new(),
            any: false,
            sort: None,
            limit: None,
            page: None,
        }
    }

    #[test]
    fn test_parse_condition() {
        let (field, op, value) = parse_condition("rating:gte:3").unwrap();
        assert_eq!((field, op, value), ("rating", "gte", json!(3)));

        let (_, _, value) = parse_condition("title:contains:Robots of Dawn").unwrap();
        assert_eq!(value, json!("Robots of Dawn"));

        let (_, _, value) = parse_condition("genres:in:[\"Scifi\",\"Fantasy\"]").unwrap();
        assert_eq!(value, json!(["Scifi", "Fantasy"]));

        let (_, op, value) = parse_condition("title:nnull").unwrap();
        assert_eq!((op, value), ("nnull", json!(true)));

        assert!(parse_condition("title").is_err());
    }

    #[test]
    fn test_parse_sort() {
        assert_eq!(parse_sort("rating"), ("rating", "asc"));
        assert_eq!(parse_sort("rating:desc"), ("rating", "desc"));
    }

    #[test]
    fn test_build_query_and() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir);
        args.select = vec!["title".to_string()];
        args.conditions = vec!["rating:gte:3".to_string(), "year:lt:2000".to_string()];
        args.sort = Some("rating:desc".to_string());
        args.limit = Some(10);
        args.page = Some(2);

        let query = build_query(&args).unwrap();
        assert_eq!(
            query.to_dict(),
            json!({"_and": [{"rating": {"_gte": 3}}, {"year": {"_lt": 2000}}]})
        );
        assert_eq!(
            query.payload()["query"]["sort"],
            json!("-rating")
        );
        assert!(query.to_sql().ends_with("LIMIT 10\nOFFSET 10"));
    }

    #[test]
    fn test_build_query_any() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir);
        args.conditions = vec!["rating:gte:4".to_string(), "title:contains:Robot".to_string()];
        args.any = true;

        let query = build_query(&args).unwrap();
        assert_eq!(
            query.to_dict(),
            json!({"_or": [{"rating": {"_gte": 4}}, {"title": {"_contains": "Robot"}}]})
        );
    }

    #[test]
    fn test_build_query_rejects_unknown_names() {
        let dir = TempDir::new().unwrap();
        let mut args = args(&dir);
        args.conditions = vec!["bogus:eq:1".to_string()];
        assert!(build_query(&args).is_err());

        args.conditions = vec!["rating:like:1".to_string()];
        assert!(build_query(&args).is_err());

        args.conditions.clear();
        args.sort = Some("rating:sideways".to_string());
        assert!(build_query(&args).is_err());
    }
}
