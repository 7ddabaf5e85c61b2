//! Database module: the backend contract and its concrete engines.
//!
//! Layout:
//! - `backend.rs`: `CredentialBackend` trait every engine implements
//! - `models.rs`: Rust structs mirroring DB rows and operation outcomes
//! - `schema.rs`: idempotent DDL per engine
//! - `sqlite.rs` / `postgres.rs`: the two adapters

pub mod backend;
pub mod models;
pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use backend::{BackendKind, CredentialBackend};
pub use models::{Outcome, Secret, SecretName, UserListing, UserSummary};
pub use postgres::{PgPool, PostgresBackend};
pub use sqlite::{SqliteBackend, SqlitePool};

use crate::error::VaultError;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Connection settings shared by every adapter.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub kind: BackendKind,
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub connect_retries: usize,
}

impl From<&crate::config::Config> for StoreConfig {
    fn from(cfg: &crate::config::Config) -> Self {
        Self {
            kind: cfg.backend_kind(),
            url: cfg.database_url.clone(),
            max_connections: cfg.max_connections,
            connect_timeout: cfg.connect_timeout(),
            connect_retries: cfg.connect_retries,
        }
    }
}

fn connect_retry_policy(max_times: usize) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(max_times)
        .with_jitter()
}

/// Open the configured backend and make sure its schema exists.
pub async fn connect(cfg: &StoreConfig) -> Result<Arc<dyn CredentialBackend>, VaultError> {
    let backend: Arc<dyn CredentialBackend> = match cfg.kind {
        BackendKind::Sqlite => Arc::new(
            with_timeout(
                cfg.connect_timeout,
                SqliteBackend::connect(&cfg.url, cfg.max_connections, cfg.connect_timeout),
            )
            .await?,
        ),
        BackendKind::Postgres => {
            let pg = (|| async {
                with_timeout(
                    cfg.connect_timeout,
                    PostgresBackend::connect(&cfg.url, cfg.max_connections, cfg.connect_timeout),
                )
                .await
            })
            .retry(connect_retry_policy(cfg.connect_retries))
            .when(|e: &VaultError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!("postgres connect failed: {}, retrying in {:?}", err, dur);
            })
            .await?;
            Arc::new(pg)
        }
    };

    if let Err(e) = backend.init_schema().await {
        backend.close().await;
        return Err(e);
    }
    info!(backend = %backend.kind(), "credential store ready");
    Ok(backend)
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, VaultError>>,
) -> Result<T, VaultError> {
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        VaultError::StorageUnavailable(format!(
            "connection not established within {}s",
            limit.as_secs()
        ))
    })?
}
