//! Bulk synthetic data for load testing.
//!
//! Built on the public `create_user` / `create_secret` operations, so seeded
//! rows obey exactly the same constraints as interactive ones.

use crate::error::VaultError;
use crate::service::credential_store::CredentialStore;
use futures::stream::{self, StreamExt, TryStreamExt};
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub users: usize,
    pub secrets_per_user: usize,
    pub prefix: String,
    pub password: String,
    pub concurrency: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            users: 10,
            secrets_per_user: 10,
            prefix: "seed".to_string(),
            password: "pass123".to_string(),
            concurrency: 8,
        }
    }
}

impl SeedPlan {
    pub fn username(&self, n: usize) -> String {
        format!("{}-{}", self.prefix, n)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users_created: usize,
    pub users_skipped: usize,
    pub secrets_created: usize,
}

fn quick_guid() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Seed one user and its secrets. Returns (user created, secrets created).
async fn seed_user(
    store: &CredentialStore,
    plan: &SeedPlan,
    n: usize,
) -> Result<(bool, usize), VaultError> {
    let username = plan.username(n);
    let created = match store.create_user(&username, &plan.password).await {
        Ok(()) => true,
        Err(VaultError::DuplicateUser(_)) => {
            warn!(%username, "seed user exists; adding secrets only");
            false
        }
        Err(e) => return Err(e),
    };

    let mut secrets = 0;
    while secrets < plan.secrets_per_user {
        let name = format!("{} secret-{}", plan.prefix, quick_guid());
        match store
            .create_secret(&username, &name, &format!("{} value-{}", plan.prefix, n))
            .await
        {
            Ok(()) => secrets += 1,
            // Name collision on the random suffix; draw another.
            Err(VaultError::DuplicateSecret { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok((created, secrets))
}

pub async fn seed(store: &CredentialStore, plan: &SeedPlan) -> Result<SeedReport, VaultError> {
    let results: Vec<(bool, usize)> = stream::iter(1..=plan.users)
        .map(|n| seed_user(store, plan, n))
        .buffer_unordered(plan.concurrency.max(1))
        .try_collect()
        .await?;

    let report = results
        .into_iter()
        .fold(SeedReport::default(), |mut acc, (created, secrets)| {
            if created {
                acc.users_created += 1;
            } else {
                acc.users_skipped += 1;
            }
            acc.secrets_created += secrets;
            acc
        });

    info!(
        users_created = report.users_created,
        users_skipped = report.users_skipped,
        secrets_created = report.secrets_created,
        "seed complete"
    );
    Ok(report)
}
