use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use parley_core::ids::UserId;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    pub username: String,
}

#[derive(Clone)]
pub struct UserRepo {
    db: Database,
}

impl UserRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a new user under the trimmed `username`.
    /// Fails with `DuplicateUser` if the username is taken; nothing is written.
    #[instrument(skip(self))]
    pub fn register(&self, username: &str) -> Result<UserRow, StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::InvalidUsername);
        }

        self.db.with_conn(|conn| {
            match conn.execute("INSERT INTO users (username) VALUES (?1)", [username]) {
                Ok(_) => {}
                Err(e) if row_helpers::is_unique_violation(&e) => {
                    debug!(username, "username already registered");
                    return Err(StoreError::DuplicateUser(username.to_string()));
                }
                Err(e) => return Err(e.into()),
            }

            let id = UserId::from_raw(conn.last_insert_rowid());
            info!(user_id = %id, username, "user registered");
            Ok(UserRow {
                id,
                username: username.to_string(),
            })
        })
    }

    /// Look up a user's id. `None` when the username is unknown.
    #[instrument(skip(self))]
    pub fn find_id(&self, username: &str) -> Result<Option<UserId>, StoreError> {
        self.db.with_conn(|conn| resolve_id(conn, username))
    }

    /// Get a user by username, failing with `UserNotFound` on a miss.
    #[instrument(skip(self))]
    pub fn get_by_username(&self, username: &str) -> Result<UserRow, StoreError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username FROM users WHERE username = ?1",
                [username],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?
            .map(|(id, username)| UserRow {
                id: UserId::from_raw(id),
                username,
            })
            .ok_or_else(|| StoreError::UserNotFound(username.to_string()))
        })
    }

    /// Get or register a user.
    /// The web layer calls this for a principal authenticated upstream, whose
    /// row may not exist yet.
    #[instrument(skip(self))]
    pub fn get_or_register(&self, username: &str) -> Result<UserRow, StoreError> {
        let username = username.trim();
        match self.get_by_username(username) {
            Ok(user) => Ok(user),
            Err(StoreError::UserNotFound(_)) => match self.register(username) {
                // Lost a race with a concurrent request for the same principal.
                Err(StoreError::DuplicateUser(_)) => self.get_by_username(username),
                other => other,
            },
            Err(e) => Err(e),
        }
    }

    /// List all users, oldest first.
    #[instrument(skip(self))]
    pub fn list(&self) -> Result<Vec<UserRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, username FROM users ORDER BY id")?;
            let mut rows = stmt.query([])?;
            let mut users = Vec::new();
            while let Some(row) = rows.next()? {
                users.push(UserRow {
                    id: UserId::from_raw(row_helpers::get(row, 0, "users", "id")?),
                    username: row_helpers::get(row, 1, "users", "username")?,
                });
            }
            Ok(users)
        })
    }
}

/// Resolve a username to its id on an already-held connection, so callers can
/// resolve and insert inside one transaction.
pub(crate) fn resolve_id(conn: &Connection, username: &str) -> Result<Option<UserId>, StoreError> {
    let id = conn
        .query_row("SELECT id FROM users WHERE username = ?1", [username], |row| {
            row.get::<_, i64>(0)
        })
        .optional()?;
    Ok(id.map(UserId::from_raw))
}

/// Like [`resolve_id`] but a miss is `UserNotFound`.
pub(crate) fn require_id(conn: &Connection, username: &str) -> Result<UserId, StoreError> {
    resolve_id(conn, username)?.ok_or_else(|| {
        debug!(username, "user lookup missed");
        StoreError::UserNotFound(username.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> (Database, UserRepo) {
        let db = Database::in_memory().unwrap();
        (db.clone(), UserRepo::new(db))
    }

    #[test]
    fn register_assigns_id() {
        let (_, repo) = test_repo();
        let luke = repo.register("luke").unwrap();
        let leia = repo.register("leia").unwrap();
        assert_eq!(luke.username, "luke");
        assert!(luke.id < leia.id);
    }

    #[test]
    fn duplicate_register_fails_without_writing() {
        let (db, repo) = test_repo();
        repo.register("luke").unwrap();
        let err = repo.register("luke").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUser(ref name) if name == "luke"));
        assert_eq!(db.row_count("users").unwrap(), 1);
    }

    #[test]
    fn empty_username_rejected() {
        let (db, repo) = test_repo();
        assert!(matches!(repo.register(""), Err(StoreError::InvalidUsername)));
        assert!(matches!(repo.register("   "), Err(StoreError::InvalidUsername)));
        assert_eq!(db.row_count("users").unwrap(), 0);
    }

    #[test]
    fn find_id_returns_none_for_unknown() {
        let (_, repo) = test_repo();
        assert_eq!(repo.find_id("nobody").unwrap(), None);
    }

    #[test]
    fn find_id_matches_register() {
        let (_, repo) = test_repo();
        let han = repo.register("han").unwrap();
        assert_eq!(repo.find_id("han").unwrap(), Some(han.id));
    }

    #[test]
    fn get_by_username_miss_is_not_found() {
        let (_, repo) = test_repo();
        let err = repo.get_by_username("ghost").unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(ref name) if name == "ghost"));
    }

    #[test]
    fn get_or_register_is_stable() {
        let (db, repo) = test_repo();
        let first = repo.get_or_register("chewie").unwrap();
        let second = repo.get_or_register("chewie").unwrap();
        assert_eq!(first, second);
        assert_eq!(db.row_count("users").unwrap(), 1);
    }

    #[test]
    fn list_in_registration_order() {
        let (_, repo) = test_repo();
        for name in ["luke", "leia", "han"] {
            repo.register(name).unwrap();
        }
        let names: Vec<String> = repo.list().unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, ["luke", "leia", "han"]);
    }

    #[test]
    fn register_stores_trimmed_name() {
        let (db, repo) = test_repo();
        let user = repo.register(" luke\t").unwrap();
        assert_eq!(user.username, "luke");
        assert_eq!(repo.find_id("luke").unwrap(), Some(user.id));

        let err = repo.register("luke ").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUser(ref name) if name == "luke"));
        assert_eq!(repo.get_or_register("  luke").unwrap().id, user.id);
        assert_eq!(db.row_count("users").unwrap(), 1);
    }

    #[test]
    fn usernames_are_case_sensitive() {
        let (_, repo) = test_repo();
        repo.register("Luke").unwrap();
        repo.register("luke").unwrap();
        assert_eq!(repo.list().unwrap().len(), 2);
    }
}
