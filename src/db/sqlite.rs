use crate::db::backend::{BackendKind, CredentialBackend};
use crate::db::models::{Outcome, Secret, SecretName, UserSummary};
use crate::db::schema::{self, SQLITE_INIT};
use crate::error::{VaultError, constraint_kind};
use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub type SqlitePool = Pool<Sqlite>;

/// How long a writer waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Embedded single-file adapter.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url`.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, VaultError> {
        let connect_opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let mut pool_opts = SqlitePoolOptions::new().acquire_timeout(acquire_timeout);
        // Each connection to `:memory:` is a separate database; keep exactly one alive.
        if url.contains(":memory:") {
            pool_opts = pool_opts
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_opts = pool_opts.max_connections(max_connections.max(1));
        }

        let pool = pool_opts.connect_with(connect_opts).await?;
        info!(backend = "sqlite", "connected");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CredentialBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn init_schema(&self) -> Result<(), VaultError> {
        for stmt in schema::statements(SQLITE_INIT) {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        debug!(backend = "sqlite", "schema ready");
        Ok(())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), VaultError> {
        sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match constraint_kind(&e) {
                Some(ErrorKind::UniqueViolation) => {
                    VaultError::DuplicateUser(username.to_string())
                }
                _ => e.into(),
            })?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, VaultError> {
        let users = sqlx::query_as::<_, UserSummary>("SELECT username FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn password_hash(&self, username: &str) -> Result<Option<String>, VaultError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// Sweeps the user's secrets in the same transaction, so the cascade holds
    /// even on a file opened elsewhere with foreign key enforcement off.
    async fn delete_user(&self, username: &str) -> Result<Outcome, VaultError> {
        let mut tx = self.pool.begin().await?;
        let swept = sqlx::query("DELETE FROM secrets WHERE owner = ?")
            .bind(username)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        debug!(%username, secrets = swept, "user delete swept secrets");
        Ok(Outcome::deleted(deleted))
    }

    async fn insert_secret(
        &self,
        owner: &str,
        name: &str,
        value: &str,
    ) -> Result<(), VaultError> {
        sqlx::query("INSERT INTO secrets (owner, name, value) VALUES (?, ?, ?)")
            .bind(owner)
            .bind(name)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| match constraint_kind(&e) {
                Some(ErrorKind::ForeignKeyViolation) => VaultError::UnknownUser(owner.to_string()),
                Some(ErrorKind::UniqueViolation) => VaultError::DuplicateSecret {
                    owner: owner.to_string(),
                    name: name.to_string(),
                },
                _ => e.into(),
            })?;
        Ok(())
    }

    async fn list_secrets(&self, owner: &str) -> Result<Vec<SecretName>, VaultError> {
        let names = sqlx::query_as::<_, SecretName>(
            "SELECT name FROM secrets WHERE owner = ? ORDER BY name",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn get_secret(&self, owner: &str, name: &str) -> Result<Option<Secret>, VaultError> {
        let secret = sqlx::query_as::<_, Secret>(
            "SELECT name, value FROM secrets WHERE owner = ? AND name = ?",
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(secret)
    }

    async fn update_secret(
        &self,
        owner: &str,
        name: &str,
        value: &str,
    ) -> Result<Outcome, VaultError> {
        let res = sqlx::query("UPDATE secrets SET value = ? WHERE owner = ? AND name = ?")
            .bind(value)
            .bind(owner)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(Outcome::updated(res.rows_affected()))
    }

    async fn delete_secret(&self, owner: &str, name: &str) -> Result<Outcome, VaultError> {
        let res = sqlx::query("DELETE FROM secrets WHERE owner = ? AND name = ?")
            .bind(owner)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(Outcome::deleted(res.rows_affected()))
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!(backend = "sqlite", "pool closed");
    }
}
