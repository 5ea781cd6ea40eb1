// directus-core/src/config.rs
// Connection settings for the API the queries are sent to

use std::env;
use std::fmt;

use crate::error::{DirectusError, Result};

pub const URL_VAR: &str = "DIRECTUS_URL";
pub const TOKEN_VAR: &str = "DIRECTUS_TOKEN";

// Names used by older setups, still honoured as fallbacks
const LEGACY_URL_VAR: &str = "URL";
const LEGACY_TOKEN_VAR: &str = "TOKEN";

#[derive(Clone, PartialEq, Eq)]
pub struct DirectusConfig {
    url: String,
    token: String,
    items_prefix: String,
}

impl DirectusConfig {
    /// Validate and normalize a base URL and API token
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let mut url = url.into().trim().to_string();
        let token = token.into().trim().to_string();

        if url.is_empty() {
            return Err(DirectusError::Config("URL not provided".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(DirectusError::Config(format!(
                "URL must start with http(s)://, got '{}'",
                url
            )));
        }
        if token.is_empty() {
            return Err(DirectusError::Config("API token not provided".to_string()));
        }
        if url.ends_with('/') {
            url.pop();
        }

        Ok(DirectusConfig {
            url,
            token,
            items_prefix: "items".to_string(),
        })
    }

    /// Read `DIRECTUS_URL` / `DIRECTUS_TOKEN` (or `URL` / `TOKEN`)
    pub fn from_env() -> Result<Self> {
        let url = read_var(URL_VAR, LEGACY_URL_VAR).ok_or_else(|| {
            DirectusError::Config(format!("URL not provided via {} or {}", URL_VAR, LEGACY_URL_VAR))
        })?;
        let token = read_var(TOKEN_VAR, LEGACY_TOKEN_VAR).ok_or_else(|| {
            DirectusError::Config(format!(
                "API token not provided via {} or {}",
                TOKEN_VAR, LEGACY_TOKEN_VAR
            ))
        })?;
        Self::new(url, token)
    }

    pub fn with_items_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.items_prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `items/<collection>` (or the configured prefix)
    pub fn endpoint_for(&self, collection: &str) -> String {
        format!("{}/{}", self.items_prefix, collection)
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.url, endpoint.trim_start_matches('/'))
    }
}

impl fmt::Debug for DirectusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self.token.chars().take(5).collect();
        f.debug_struct("DirectusConfig")
            .field("url", &self.url)
            .field("token", &format!("{}...", shown))
            .field("items_prefix", &self.items_prefix)
            .finish()
    }
}

fn read_var(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| env::var(fallback).ok().filter(|v| !v.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_url() {
        let config = DirectusConfig::new("https://cms.example.com/", "secret-token").unwrap();
        assert_eq!(config.url(), "https://cms.example.com");
        assert_eq!(config.token(), "secret-token");
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(matches!(
            DirectusConfig::new("", "t"),
            Err(DirectusError::Config(_))
        ));
        assert!(DirectusConfig::new("cms.example.com", "t").is_err());
        assert!(DirectusConfig::new("http://cms.example.com", " ").is_err());
    }

    #[test]
    fn test_endpoints() {
        let config = DirectusConfig::new("http://localhost:8055", "t").unwrap();
        assert_eq!(config.endpoint_for("books"), "items/books");
        assert_eq!(config.url_for("items/books"), "http://localhost:8055/items/books");

        let custom = config.with_items_prefix("/api/items/");
        assert_eq!(custom.endpoint_for("books"), "api/items/books");
        assert_eq!(custom.url_for("/server/health"), "http://localhost:8055/server/health");
    }

    #[test]
    fn test_debug_masks_token() {
        let config = DirectusConfig::new("http://localhost", "abcdefghij").unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("abcde..."));
        assert!(!debug.contains("abcdefghij"));
    }
}
