use sqlx::Error as SqlxError;
use sqlx::error::ErrorKind;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum VaultError {
    #[error("user '{0}' already exists")]
    DuplicateUser(String),

    #[error("secret '{name}' already exists for user '{owner}'")]
    DuplicateSecret { owner: String, name: String },

    #[error("user '{0}' does not exist")]
    UnknownUser(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("password hashing error: {0}")]
    Hashing(String),

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl VaultError {
    /// Process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            VaultError::DuplicateUser(_)
            | VaultError::DuplicateSecret { .. }
            | VaultError::UnknownUser(_)
            | VaultError::Hashing(_) => 1,
            VaultError::InvalidInput(_) | VaultError::Config(_) => 2,
            VaultError::StorageUnavailable(_) => 3,
        }
    }

    /// Only connection-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::StorageUnavailable(_))
    }
}

impl From<SqlxError> for VaultError {
    fn from(e: SqlxError) -> Self {
        VaultError::StorageUnavailable(e.to_string())
    }
}

impl From<figment::Error> for VaultError {
    fn from(e: figment::Error) -> Self {
        VaultError::Config(Box::new(e))
    }
}

impl From<argon2::password_hash::Error> for VaultError {
    fn from(e: argon2::password_hash::Error) -> Self {
        VaultError::Hashing(e.to_string())
    }
}

/// Constraint class of a failed statement, if the engine reported one.
pub(crate) fn constraint_kind(e: &SqlxError) -> Option<ErrorKind> {
    match e {
        SqlxError::Database(db_err) => match db_err.kind() {
            kind @ (ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation) => Some(kind),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_separate_domain_and_storage_failures() {
        assert_eq!(VaultError::DuplicateUser("alice".into()).exit_code(), 1);
        assert_eq!(VaultError::UnknownUser("bob".into()).exit_code(), 1);
        assert_eq!(VaultError::InvalidInput("empty".into()).exit_code(), 2);
        assert_eq!(
            VaultError::StorageUnavailable("refused".into()).exit_code(),
            3
        );
    }

    #[test]
    fn non_database_errors_have_no_constraint_kind() {
        assert!(constraint_kind(&SqlxError::PoolClosed).is_none());
        assert!(constraint_kind(&SqlxError::RowNotFound).is_none());
    }

    #[test]
    fn sqlx_errors_surface_as_storage_unavailable() {
        let err: VaultError = SqlxError::PoolTimedOut.into();
        assert!(matches!(err, VaultError::StorageUnavailable(_)));
    }
}
