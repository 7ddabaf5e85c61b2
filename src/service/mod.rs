pub mod credential_store;
pub mod password;
pub mod seed;

pub use credential_store::CredentialStore;
pub use password::PasswordHashing;
pub use seed::{SeedPlan, SeedReport};
