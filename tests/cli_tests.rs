mod common;

use clap::Parser;
use credvault::cli::{Cli, Commands, Report};
use credvault::db::UserSummary;
use credvault::{CredentialStore, Secret, VaultError};

fn command(args: &[&str]) -> Commands {
    let argv = std::iter::once("credvault").chain(args.iter().copied());
    Cli::try_parse_from(argv)
        .expect("arguments should parse")
        .command
}

async fn run(store: &CredentialStore, args: &[&str]) -> Result<Report, VaultError> {
    command(args).execute(store).await
}

#[tokio::test]
async fn full_secret_lifecycle_through_commands() {
    let t = common::sqlite().await;
    let store = &t.store;

    let created = run(store, &["users:create", "--user", "alice", "--pass", "pw"])
        .await
        .unwrap();
    assert_eq!(created, Report::Done("user 'alice' created".into()));

    run(
        store,
        &["secrets:create", "--user", "alice", "--name", "db", "--value", "s3cr3t"],
    )
    .await
    .unwrap();

    let got = run(store, &["secrets:get", "--user", "alice", "--name", "db"])
        .await
        .unwrap();
    assert_eq!(
        got,
        Report::Secret(Secret {
            name: "db".into(),
            value: "s3cr3t".into()
        })
    );
    assert_eq!(got.render(false), "db: s3cr3t");

    let updated = run(
        store,
        &["secrets:update", "--user", "alice", "--name", "db", "--value", "newval"],
    )
    .await
    .unwrap();
    assert_eq!(updated.exit_code(), 0);
    assert!(updated.render(false).contains("updated"));

    let listed = run(store, &["secrets:list", "--user", "alice"]).await.unwrap();
    let out = listed.render(false);
    assert!(out.contains("db"));
    assert!(!out.contains("newval"));

    let deleted = run(store, &["secrets:delete", "--user", "alice", "--name", "db"])
        .await
        .unwrap();
    assert!(deleted.render(false).contains("deleted"));

    let missing = run(store, &["secrets:get", "--user", "alice", "--name", "db"])
        .await
        .unwrap();
    assert!(matches!(missing, Report::NotFound { .. }));
    assert_eq!(missing.exit_code(), 0);

    t.store.close().await;
}

#[tokio::test]
async fn users_list_reports_every_user_and_count() {
    let t = common::sqlite().await;
    for user in ["carol", "alice", "bob"] {
        run(&t.store, &["users:create", "--user", user, "--pass", "pw"])
            .await
            .unwrap();
    }

    let Report::Users(listing) = run(&t.store, &["users:list"]).await.unwrap() else {
        panic!("expected a user listing");
    };
    assert_eq!(listing.count, 3);
    let names: Vec<_> = listing.users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["alice", "bob", "carol"]);
    assert!(!listing.users.contains(&UserSummary {
        username: "dave".into()
    }));
}

#[tokio::test]
async fn domain_errors_carry_exit_codes() {
    let t = common::sqlite().await;

    let unknown = run(
        &t.store,
        &["secrets:create", "--user", "ghost", "--name", "db", "--value", "x"],
    )
    .await
    .unwrap_err();
    assert!(matches!(unknown, VaultError::UnknownUser(_)));
    assert_eq!(unknown.exit_code(), 1);

    run(&t.store, &["users:create", "--user", "alice", "--pass", "pw"])
        .await
        .unwrap();
    let dupe = run(&t.store, &["users:create", "--user", "alice", "--pass", "pw"])
        .await
        .unwrap_err();
    assert!(dupe.to_string().contains("already exists"));
}

#[tokio::test]
async fn verify_reports_match_and_mismatch() {
    let t = common::sqlite().await;
    run(&t.store, &["users:create", "--user", "alice", "--pass", "right"])
        .await
        .unwrap();

    let ok = run(&t.store, &["users:verify", "--user", "alice", "--pass", "right"])
        .await
        .unwrap();
    assert_eq!(ok.exit_code(), 0);

    let bad = run(&t.store, &["users:verify", "--user", "alice", "--pass", "wrong"])
        .await
        .unwrap();
    assert_eq!(bad.exit_code(), 1);
    assert!(bad.render(true).contains(r#""valid":false"#));
}

#[tokio::test]
async fn seed_populates_and_is_rerunnable() {
    let t = common::sqlite().await;
    let args = [
        "seed",
        "--users",
        "3",
        "--secrets",
        "4",
        "--prefix",
        "ricardo",
        "--concurrency",
        "2",
    ];

    let Report::Seeded(first) = run(&t.store, &args).await.unwrap() else {
        panic!("expected a seed report");
    };
    assert_eq!(first.users_created, 3);
    assert_eq!(first.secrets_created, 12);

    let Report::Seeded(second) = run(&t.store, &args).await.unwrap() else {
        panic!("expected a seed report");
    };
    assert_eq!(second.users_created, 0);
    assert_eq!(second.users_skipped, 3);

    assert_eq!(t.store.list_users().await.unwrap().count, 3);
    assert_eq!(t.store.list_secrets("ricardo-2").await.unwrap().len(), 8);
    assert!(t.store.verify_user("ricardo-1", "pass123").await.unwrap());
}
