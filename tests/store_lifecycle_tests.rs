mod common;

use credvault::{BackendKind, Config, CredentialStore, VaultError};

#[tokio::test]
async fn reopening_keeps_data_and_schema_init_is_idempotent() {
    let t = common::sqlite().await;
    t.store.create_user("alice", "pw").await.unwrap();
    t.store.create_secret("alice", "db", "v").await.unwrap();
    t.store.close().await;

    // Second startup re-runs the DDL against the existing file.
    let reopened = CredentialStore::open(&t.cfg).await.unwrap();
    assert_eq!(reopened.list_users().await.unwrap().count, 1);
    assert_eq!(
        reopened.get_secret("alice", "db").await.unwrap().unwrap().value,
        "v"
    );
    reopened.close().await;
}

#[tokio::test]
async fn two_handles_on_one_file_share_constraints() {
    let t = common::sqlite().await;
    let other = CredentialStore::open(&t.cfg).await.unwrap();

    t.store.create_user("alice", "pw").await.unwrap();
    let err = other.create_user("alice", "pw").await.unwrap_err();
    assert!(matches!(err, VaultError::DuplicateUser(_)));

    other.create_secret("alice", "db", "from-other").await.unwrap();
    assert_eq!(
        t.store.get_secret("alice", "db").await.unwrap().unwrap().value,
        "from-other"
    );

    other.close().await;
    t.store.close().await;
}

#[tokio::test]
async fn operations_after_close_are_storage_unavailable() {
    let t = common::sqlite().await;
    t.store.close().await;

    assert!(matches!(
        t.store.list_users().await,
        Err(VaultError::StorageUnavailable(_))
    ));
    assert!(matches!(
        t.store.create_user("alice", "pw").await,
        Err(VaultError::StorageUnavailable(_))
    ));
}

#[tokio::test]
async fn in_memory_database_keeps_state_across_calls() {
    let cfg = Config {
        backend: Some(BackendKind::Sqlite),
        database_url: "sqlite::memory:".into(),
        hash_cost: 1,
        hash_memory_kib: 1024,
        ..Config::default()
    };
    let store = CredentialStore::open(&cfg).await.unwrap();
    store.create_user("alice", "pw").await.unwrap();
    store.create_secret("alice", "db", "v").await.unwrap();
    assert_eq!(store.list_secrets("alice").await.unwrap().len(), 1);
    store.close().await;
}

#[tokio::test]
async fn invalid_work_factor_fails_before_connecting() {
    let cfg = Config {
        hash_cost: 0,
        database_url: "sqlite:///nonexistent-dir/for/credvault/vault.db".into(),
        ..Config::default()
    };
    assert!(matches!(
        CredentialStore::open(&cfg).await,
        Err(VaultError::InvalidInput(_))
    ));
}
