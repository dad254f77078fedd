//! Configuration Module
//!
//! Handles loading server configuration from environment variables and
//! namespace definitions from an optional JSON file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cache::{NamespaceConfig, DEFAULT_LOCK_STRIPES};
use crate::schema::SchemaType;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Number of striped merge locks
    pub lock_stripes: usize,
    /// Capacity of the refresh feed channel
    pub feed_buffer: usize,
    /// Optional JSON file listing namespaces
    pub namespaces_file: Option<PathBuf>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `LOCK_STRIPES` - Striped merge locks (default: 64)
    /// - `FEED_BUFFER` - Refresh feed channel capacity (default: 1024)
    /// - `NAMESPACES_FILE` - JSON array of namespace definitions (default: unset)
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            lock_stripes: env::var("LOCK_STRIPES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LOCK_STRIPES),
            feed_buffer: env::var("FEED_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(1024),
            namespaces_file: env::var("NAMESPACES_FILE").ok().map(PathBuf::from),
        }
    }

    /// Loads namespace definitions.
    ///
    /// Falls back to [`default_namespaces`] when no file is configured.
    pub fn load_namespaces(&self) -> anyhow::Result<Vec<NamespaceConfig>> {
        match &self.namespaces_file {
            Some(path) => read_namespaces(path),
            None => Ok(default_namespaces()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            lock_stripes: DEFAULT_LOCK_STRIPES,
            feed_buffer: 1024,
            namespaces_file: None,
        }
    }
}

fn read_namespaces(path: &Path) -> anyhow::Result<Vec<NamespaceConfig>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading namespaces file {}", path.display()))?;
    parse_namespaces(&raw).with_context(|| format!("parsing namespaces file {}", path.display()))
}

/// Parses a JSON array of namespace definitions.
pub fn parse_namespaces(raw: &str) -> anyhow::Result<Vec<NamespaceConfig>> {
    let namespaces: Vec<NamespaceConfig> = serde_json::from_str(raw)?;
    for ns in &namespaces {
        anyhow::ensure!(
            ns.fields.iter().any(|f| f == &ns.ts_column),
            "namespace {} does not declare its timestamp column {}",
            ns.namespace,
            ns.ts_column
        );
    }
    Ok(namespaces)
}

/// Single demo namespace registered when no file is configured.
pub fn default_namespaces() -> Vec<NamespaceConfig> {
    vec![NamespaceConfig {
        namespace: "default".to_string(),
        cache_enabled: true,
        ts_column: "last_updated".to_string(),
        schema_id: "default_v1".to_string(),
        schema_type: SchemaType::Json,
        fields: vec![
            "id".to_string(),
            "value".to_string(),
            "status".to_string(),
            "last_updated".to_string(),
        ],
        last_updated_time: 0,
    }]
}
