//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use lumina_directory::ValidationPolicy;
use lumina_shared::constants::DEFAULT_MAX_PHOTO_DIMENSION;
use lumina_store::LocalStore;

/// Where records are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// One JSON file per collection key.
    Local,
    /// SQLite tables.
    Table,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Table => "table",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "table" | "sqlite" => Ok(Self::Table),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP API.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Env: `STORE_BACKEND` (`local` / `table`)
    /// Default: `local`
    pub store_backend: StoreBackend,

    /// Directory holding collection files and the database.
    /// Env: `DATA_DIR`
    /// Default: the platform data directory, else `./data`.
    pub data_dir: PathBuf,

    /// Larger photo side after re-encoding, in pixels.
    /// Env: `MAX_PHOTO_DIMENSION`
    /// Default: `1500`
    pub max_photo_dimension: u32,

    /// Env: `VALIDATION_POLICY` (`strict` / `lenient`)
    /// Default: `strict`
    pub validation_policy: ValidationPolicy,

    /// Also read collections written under older storage keys.
    /// Env: `READ_LEGACY_KEYS` (true/false)
    /// Default: `true`
    pub read_legacy_keys: bool,

    /// Copy local collections into the table backend at startup.
    /// Env: `IMPORT_LOCAL_DATA` (true/false)
    /// Default: `false`
    pub import_local_data: bool,

    /// Request body limit, which bounds photo uploads (10 MiB).
    /// Env: `MAX_UPLOAD_BYTES`
    pub max_upload_bytes: usize,

    /// Env: `INSTANCE_NAME`
    pub instance_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            store_backend: StoreBackend::Local,
            data_dir: PathBuf::from("./data"),
            max_photo_dimension: DEFAULT_MAX_PHOTO_DIMENSION,
            validation_policy: ValidationPolicy::Strict,
            read_legacy_keys: true,
            import_local_data: false,
            max_upload_bytes: 10 * 1024 * 1024,
            instance_name: lumina_shared::constants::APP_NAME.to_string(),
        }
    }
}

fn flag(val: &str) -> bool {
    val != "false" && val != "0"
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok());

        if std::env::var("DATA_DIR").is_err() {
            match LocalStore::default_dir() {
                Ok(dir) => config.data_dir = dir,
                Err(e) => tracing::warn!(error = %e, "No platform data directory, using ./data"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// Build from an arbitrary key lookup. Invalid values are logged and
    /// ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(val) = lookup("STORE_BACKEND") {
            match val.parse() {
                Ok(backend) => config.store_backend = backend,
                Err(e) => tracing::warn!(error = %e, "Invalid STORE_BACKEND, using default"),
            }
        }

        if let Some(path) = lookup("DATA_DIR") {
            if !path.trim().is_empty() {
                config.data_dir = PathBuf::from(path);
            }
        }

        if let Some(val) = lookup("MAX_PHOTO_DIMENSION") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.max_photo_dimension = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_PHOTO_DIMENSION, using default"),
            }
        }

        if let Some(val) = lookup("VALIDATION_POLICY") {
            match val.parse() {
                Ok(policy) => config.validation_policy = policy,
                Err(e) => tracing::warn!(error = %e, "Invalid VALIDATION_POLICY, using default"),
            }
        }

        if let Some(val) = lookup("READ_LEGACY_KEYS") {
            config.read_legacy_keys = flag(&val);
        }

        if let Some(val) = lookup("IMPORT_LOCAL_DATA") {
            config.import_local_data = flag(&val);
        }

        if let Some(val) = lookup("MAX_UPLOAD_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_bytes = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_BYTES, using default"),
            }
        }

        if let Some(name) = lookup("INSTANCE_NAME") {
            config.instance_name = name;
        }

        config
    }
}
