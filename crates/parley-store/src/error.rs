#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("username already exists: {0}")]
    DuplicateUser(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("username must not be empty")]
    InvalidUsername,

    #[error("corrupt row in {table}.{column}: {detail}")]
    CorruptRow {
        table: &'static str,
        column: &'static str,
        detail: String,
    },

    #[error("IO error: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl StoreError {
    /// Lookup misses and conflicts the caller can present; anything else is
    /// a storage failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::DuplicateUser(_) | Self::UserNotFound(_) | Self::InvalidUsername
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_user() {
        let err = StoreError::UserNotFound("ghost".into());
        assert_eq!(err.to_string(), "user not found: ghost");
    }

    #[test]
    fn rusqlite_errors_become_database() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn lookup_failures_are_user_facing() {
        assert!(StoreError::DuplicateUser("luke".into()).is_user_facing());
        assert!(StoreError::InvalidUsername.is_user_facing());
    }
}
