use crate::error::VaultError;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

/// Salted Argon2id hashing with a tunable work factor.
///
/// Hashes are PHC strings, so verification reads the parameters back from the
/// stored value and keeps working after the work factor is changed.
#[derive(Debug, Clone)]
pub struct PasswordHashing {
    params: Params,
}

impl PasswordHashing {
    /// `work_factor` is the Argon2 iteration count (at least 1).
    pub fn new(work_factor: u32, memory_kib: u32) -> Result<Self, VaultError> {
        let params = Params::new(memory_kib, work_factor, Params::DEFAULT_P_COST, None)
            .map_err(|e| VaultError::InvalidInput(format!("hash parameters: {e}")))?;
        Ok(Self { params })
    }

    pub fn work_factor(&self) -> u32 {
        self.params.t_cost()
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, VaultError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2().hash_password(plaintext.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` on a wrong password; `Err` only for a malformed stored hash.
    pub fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, VaultError> {
        let parsed = PasswordHash::new(stored)?;
        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
