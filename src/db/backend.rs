//! Storage contract every concrete engine implements.
//!
//! Adapters own their connection pool. Uniqueness and referential integrity
//! are enforced by the engine's constraints and reported through the error
//! taxonomy, never by a read-then-write check.

use crate::db::models::{Outcome, Secret, SecretName, UserSummary};
use crate::error::VaultError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded single-file database.
    #[serde(alias = "sqlite3")]
    Sqlite,
    /// Networked PostgreSQL server.
    #[serde(alias = "postgresql", alias = "pg")]
    #[value(alias = "postgresql", alias = "pg")]
    Postgres,
}

impl BackendKind {
    pub fn from_url(url: &str) -> Self {
        let scheme = url.split_once(':').map(|(s, _)| s).unwrap_or_default();
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Self::Postgres,
            _ => Self::Sqlite,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
            Self::Postgres => f.write_str("postgres"),
        }
    }
}

#[async_trait]
pub trait CredentialBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Create tables, constraints and views if missing.
    async fn init_schema(&self) -> Result<(), VaultError>;

    /// Fails with `DuplicateUser` when the username is taken.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), VaultError>;

    async fn list_users(&self) -> Result<Vec<UserSummary>, VaultError>;

    /// Stored hash for `username`, if the user exists.
    async fn password_hash(&self, username: &str) -> Result<Option<String>, VaultError>;

    /// Remove a user together with every secret it owns.
    async fn delete_user(&self, username: &str) -> Result<Outcome, VaultError>;

    /// Fails with `UnknownUser` for a missing owner and `DuplicateSecret`
    /// when `(owner, name)` already exists.
    async fn insert_secret(&self, owner: &str, name: &str, value: &str)
    -> Result<(), VaultError>;

    async fn list_secrets(&self, owner: &str) -> Result<Vec<SecretName>, VaultError>;

    async fn get_secret(&self, owner: &str, name: &str) -> Result<Option<Secret>, VaultError>;

    async fn update_secret(
        &self,
        owner: &str,
        name: &str,
        value: &str,
    ) -> Result<Outcome, VaultError>;

    async fn delete_secret(&self, owner: &str, name: &str) -> Result<Outcome, VaultError>;

    /// Release every pooled connection. Later calls fail with `StorageUnavailable`.
    async fn close(&self);
}
