use crate::db::backend::{BackendKind, CredentialBackend};
use crate::db::models::{Outcome, Secret, SecretName, UserSummary};
use crate::db::schema::{self, POSTGRES_INIT, POSTGRES_SCHEMA_LOCK};
use crate::error::{VaultError, constraint_kind};
use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub type PgPool = Pool<Postgres>;

/// Networked adapter backed by a PostgreSQL server.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, VaultError> {
        let connect_opts = PgConnectOptions::from_str(url)?.application_name("credvault");
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(acquire_timeout)
            .connect_with(connect_opts)
            .await?;
        info!(backend = "postgres", "connected");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialBackend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    /// Runs under a transaction-scoped advisory lock so that processes starting
    /// together do not race on `CREATE ... IF NOT EXISTS`.
    async fn init_schema(&self) -> Result<(), VaultError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(POSTGRES_SCHEMA_LOCK)
            .execute(&mut *tx)
            .await?;
        for stmt in schema::statements(POSTGRES_INIT) {
            sqlx::query(stmt).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        debug!(backend = "postgres", "schema ready");
        Ok(())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), VaultError> {
        sqlx::query("INSERT INTO users (username, password_hash) VALUES ($1, $2)")
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
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT username FROM user_directory ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn password_hash(&self, username: &str) -> Result<Option<String>, VaultError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|r| r.0))
    }

    /// Secrets go with the user through the native `ON DELETE CASCADE`.
    async fn delete_user(&self, username: &str) -> Result<Outcome, VaultError> {
        let res = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(Outcome::deleted(res.rows_affected()))
    }

    async fn insert_secret(
        &self,
        owner: &str,
        name: &str,
        value: &str,
    ) -> Result<(), VaultError> {
        sqlx::query("INSERT INTO secrets (owner, name, value) VALUES ($1, $2, $3)")
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
            "SELECT name FROM secrets WHERE owner = $1 ORDER BY name",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn get_secret(&self, owner: &str, name: &str) -> Result<Option<Secret>, VaultError> {
        let secret = sqlx::query_as::<_, Secret>(
            "SELECT name, value FROM secrets WHERE owner = $1 AND name = $2",
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
        let res = sqlx::query("UPDATE secrets SET value = $3 WHERE owner = $1 AND name = $2")
            .bind(owner)
            .bind(name)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(Outcome::updated(res.rows_affected()))
    }

    async fn delete_secret(&self, owner: &str, name: &str) -> Result<Outcome, VaultError> {
        let res = sqlx::query("DELETE FROM secrets WHERE owner = $1 AND name = $2")
            .bind(owner)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(Outcome::deleted(res.rows_affected()))
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!(backend = "postgres", "pool closed");
    }
}
