use crate::config::Config;
use crate::db::{self, CredentialBackend, Outcome, Secret, SecretName, StoreConfig, UserListing};
use crate::error::VaultError;
use crate::service::password::PasswordHashing;
use std::sync::Arc;
use tracing::{debug, info};

/// The user/secret CRUD contract, identical over every backend.
///
/// Holds no rows between calls; each operation is one statement (or one
/// transaction) against the adapter's pool.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn CredentialBackend>,
    hashing: PasswordHashing,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn CredentialBackend>, hashing: PasswordHashing) -> Self {
        Self { backend, hashing }
    }

    /// Connect the configured backend and prepare its schema.
    pub async fn open(cfg: &Config) -> Result<Self, VaultError> {
        let hashing = PasswordHashing::new(cfg.hash_cost, cfg.hash_memory_kib)?;
        info!(
            backend = %cfg.backend_kind(),
            database_url = %cfg.redacted_url(),
            "opening credential store"
        );
        let backend = db::connect(&StoreConfig::from(cfg)).await?;
        Ok(Self::new(backend, hashing))
    }

    pub fn backend(&self) -> &dyn CredentialBackend {
        self.backend.as_ref()
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<(), VaultError> {
        require("username", username)?;
        require("password", password)?;

        let hashing = self.hashing.clone();
        let plaintext = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hashing.hash(&plaintext))
            .await
            .map_err(|e| VaultError::Hashing(format!("hashing task failed: {e}")))??;

        self.backend.insert_user(username, &password_hash).await?;
        info!(%username, "user created");
        Ok(())
    }

    pub async fn list_users(&self) -> Result<UserListing, VaultError> {
        let users = self.backend.list_users().await?;
        Ok(UserListing::from(users))
    }

    /// Check `password` against the stored hash. Fails with `UnknownUser`
    /// when there is no such user.
    pub async fn verify_user(&self, username: &str, password: &str) -> Result<bool, VaultError> {
        let stored = self
            .backend
            .password_hash(username)
            .await?
            .ok_or_else(|| VaultError::UnknownUser(username.to_string()))?;

        let hashing = self.hashing.clone();
        let plaintext = password.to_string();
        let ok = tokio::task::spawn_blocking(move || hashing.verify(&plaintext, &stored))
            .await
            .map_err(|e| VaultError::Hashing(format!("verify task failed: {e}")))??;
        debug!(%username, ok, "password verified");
        Ok(ok)
    }

    /// Remove a user and, through the backend's cascade, all of its secrets.
    pub async fn delete_user(&self, username: &str) -> Result<Outcome, VaultError> {
        let outcome = self.backend.delete_user(username).await?;
        info!(%username, ?outcome, "user delete");
        Ok(outcome)
    }

    pub async fn create_secret(
        &self,
        owner: &str,
        name: &str,
        value: &str,
    ) -> Result<(), VaultError> {
        require("user", owner)?;
        require("secret name", name)?;
        self.backend.insert_secret(owner, name, value).await?;
        info!(%owner, %name, "secret created");
        Ok(())
    }

    pub async fn list_secrets(&self, owner: &str) -> Result<Vec<SecretName>, VaultError> {
        self.backend.list_secrets(owner).await
    }

    /// `None` when `(owner, name)` does not exist.
    pub async fn get_secret(&self, owner: &str, name: &str) -> Result<Option<Secret>, VaultError> {
        self.backend.get_secret(owner, name).await
    }

    pub async fn update_secret(
        &self,
        owner: &str,
        name: &str,
        value: &str,
    ) -> Result<Outcome, VaultError> {
        let outcome = self.backend.update_secret(owner, name, value).await?;
        debug!(%owner, %name, ?outcome, "secret update");
        Ok(outcome)
    }

    pub async fn delete_secret(&self, owner: &str, name: &str) -> Result<Outcome, VaultError> {
        let outcome = self.backend.delete_secret(owner, name).await?;
        debug!(%owner, %name, ?outcome, "secret delete");
        Ok(outcome)
    }

    /// Release the backend's connections.
    pub async fn close(&self) {
        self.backend.close().await;
    }
}

fn require(field: &str, value: &str) -> Result<(), VaultError> {
    if value.is_empty() {
        return Err(VaultError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}
