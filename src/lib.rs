pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod service;

pub use config::Config;
pub use db::{BackendKind, CredentialBackend, Outcome, Secret, SecretName, UserListing};
pub use error::VaultError;
pub use service::{CredentialStore, PasswordHashing};
