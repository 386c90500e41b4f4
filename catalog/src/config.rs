//! Runtime configuration for the catalog service
//!
//! Read once from `CATALOG_*` environment variables; the binary applies CLI
//! overrides on top before opening the store.

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use crate::search::DEFAULT_LIMIT;

/// Catalog configuration, passed explicitly into [`crate::CatalogStore::open`].
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// SQLite database file. Env: `CATALOG_DB`, default `catalog.sqlite`.
    pub db_path: PathBuf,
    /// Address the HTTP server binds to. Env: `CATALOG_BIND`, default `0.0.0.0:8530`.
    pub bind_addr: SocketAddr,
    /// Search results returned when the client gives no limit. Env: `CATALOG_DEFAULT_LIMIT`, default 10.
    pub default_limit: usize,
    /// Maximum pooled SQLite connections. Env: `CATALOG_POOL_SIZE`, default 8.
    pub pool_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("catalog.sqlite"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8530)),
            default_limit: DEFAULT_LIMIT,
            pool_size: 8,
        }
    }
}

impl CatalogConfig {
    /// Config for a database file with every other setting at its default.
    pub fn with_db_path(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, applying defaults.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let db_path = lookup("CATALOG_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let bind_addr = match lookup("CATALOG_BIND") {
            Some(raw) => SocketAddr::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("Invalid CATALOG_BIND '{}': {}", raw, e))?,
            None => defaults.bind_addr,
        };

        let default_limit = parse_or("CATALOG_DEFAULT_LIMIT", &lookup, defaults.default_limit)?;
        let pool_size = parse_or("CATALOG_POOL_SIZE", &lookup, defaults.pool_size)?;

        Ok(CatalogConfig {
            db_path,
            bind_addr,
            default_limit,
            pool_size,
        })
    }
}

fn parse_or<T>(name: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {}: {}", name, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = CatalogConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from("catalog.sqlite"));
        assert_eq!(config.bind_addr.port(), 8530);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.pool_size, 8);
    }

    #[test]
    fn test_overrides() {
        let config = CatalogConfig::from_lookup(lookup(&[
            ("CATALOG_DB", "/tmp/books.db"),
            ("CATALOG_BIND", "127.0.0.1:9000"),
            ("CATALOG_DEFAULT_LIMIT", "25"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/books.db"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.default_limit, 25);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(CatalogConfig::from_lookup(lookup(&[("CATALOG_BIND", "nowhere")])).is_err());
        assert!(CatalogConfig::from_lookup(lookup(&[("CATALOG_DEFAULT_LIMIT", "-1")])).is_err());
        assert!(CatalogConfig::from_lookup(lookup(&[("CATALOG_POOL_SIZE", "lots")])).is_err());
    }
}
