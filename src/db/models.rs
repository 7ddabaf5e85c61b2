use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct UserSummary {
    pub username: String,
}

/// All users plus their count, as returned by `users:list`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserListing {
    pub count: usize,
    pub users: Vec<UserSummary>,
}

impl From<Vec<UserSummary>> for UserListing {
    fn from(users: Vec<UserSummary>) -> Self {
        Self {
            count: users.len(),
            users,
        }
    }
}

/// A secret as it appears in listings. Carries no value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct SecretName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct Secret {
    pub name: String,
    pub value: String,
}

/// Result of a mutation that targets an existing row.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Updated,
    Deleted,
    NotFound,
}

impl Outcome {
    pub fn updated(rows_affected: u64) -> Self {
        if rows_affected > 0 {
            Self::Updated
        } else {
            Self::NotFound
        }
    }

    pub fn deleted(rows_affected: u64) -> Self {
        if rows_affected > 0 {
            Self::Deleted
        } else {
            Self::NotFound
        }
    }

    pub fn is_found(self) -> bool {
        self != Self::NotFound
    }
}
