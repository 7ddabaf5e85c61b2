#![allow(dead_code)]

use credvault::{BackendKind, Config, CredentialStore};
use rand::Rng;
use tempfile::TempDir;

/// Set to a reachable server to run the contract suite against Postgres too.
pub const POSTGRES_URL_ENV: &str = "CREDVAULT_TEST_POSTGRES_URL";

pub struct TestStore {
    pub store: CredentialStore,
    pub cfg: Config,
    _dir: Option<TempDir>,
}

fn fast_config(backend: BackendKind, database_url: String) -> Config {
    Config {
        backend: Some(backend),
        database_url,
        hash_cost: 1,
        hash_memory_kib: 1024,
        connect_timeout_secs: 5,
        ..Config::default()
    }
}

pub async fn sqlite() -> TestStore {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("vault.db").display());
    let cfg = fast_config(BackendKind::Sqlite, url);
    let store = CredentialStore::open(&cfg)
        .await
        .expect("failed to open sqlite store");
    TestStore {
        store,
        cfg,
        _dir: Some(dir),
    }
}

pub async fn postgres() -> Option<TestStore> {
    let url = std::env::var(POSTGRES_URL_ENV).ok()?;
    let cfg = fast_config(BackendKind::Postgres, url);
    let store = CredentialStore::open(&cfg)
        .await
        .expect("failed to open postgres store");
    Some(TestStore {
        store,
        cfg,
        _dir: None,
    })
}

/// Name that cannot collide with rows left behind by other runs.
pub fn unique(base: &str) -> String {
    let suffix: u64 = rand::thread_rng().r#gen();
    format!("{base}-{suffix:x}")
}
