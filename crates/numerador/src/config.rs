//! Configuration for the database, the numbering policy and the desk.
//!
//! Every section has a usable `Default` and every field is optional in the
//! JSON form, so a deployment only writes what it changes:
//!
//! ```json
//! {
//!   "database": { "path": "/var/lib/numerador/numerador.db" },
//!   "registry": { "number_format": { "prefix": "466" } },
//!   "desk": {
//!     "credentials": { "username": "plantao", "password_hash": "<blake3 hex>" }
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use numerador_core::{NumberFormat, DEFAULT_DOCUMENT_TYPES};
use numerador_store::{SqliteOptions, SqliteStore, StoreError};

use crate::error::ConfigError;

/// Where the SQLite database lives and how long to wait on its locks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("numerador.db"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn sqlite_options(&self) -> SqliteOptions {
        SqliteOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }

    /// Open (and migrate) the configured database.
    pub fn open(&self) -> Result<SqliteStore, StoreError> {
        SqliteStore::open_with_options(&self.path, &self.sqlite_options())
    }
}

/// Configuration for the Registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Numbering policy applied at issuance.
    pub number_format: NumberFormat,
}

/// Login for the desk. Only a blake3 hash of the password is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    /// Hex-encoded blake3 hash of the password.
    pub password_hash: String,
}

impl Credentials {
    /// Build credentials from a plaintext password.
    pub fn from_password(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_hash: blake3::hash(password.as_bytes()).to_hex().to_string(),
        }
    }

    /// Check a login attempt.
    ///
    /// A malformed stored hash never matches.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Ok(expected) = blake3::Hash::from_hex(&self.password_hash) else {
            return false;
        };
        // blake3::Hash equality is constant-time.
        let password_ok = blake3::hash(password.as_bytes()) == expected;
        password_ok && self.username == username
    }
}

/// Configuration for the Desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Types offered for issuance.
    pub document_types: Vec<String>,
    /// Accepted login; with `None` every login is refused.
    pub credentials: Option<Credentials>,
    /// Lifetime of a session after login.
    pub session_ttl_secs: u64,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            document_types: DEFAULT_DOCUMENT_TYPES.iter().map(|t| t.to_string()).collect(),
            credentials: None,
            session_ttl_secs: 8 * 60 * 60,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub registry: RegistryConfig,
    pub desk: DeskConfig,
}

impl AppConfig {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.desk.document_types.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid("empty document type in desk.document_types".into()));
        }
        if self.registry.number_format.width == 0 {
            return Err(ConfigError::Invalid("number_format.width must be at least 1".into()));
        }
        Ok(())
    }
}
