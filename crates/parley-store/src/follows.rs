use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use parley_core::ids::UserId;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;
use crate::users::require_id;

/// A directed edge: `follower_id` follows `following_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub following_id: UserId,
}

#[derive(Clone)]
pub struct FollowRepo {
    db: Database,
}

impl FollowRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record that `follower` follows `following`.
    ///
    /// Both usernames are resolved in the same transaction as the insert. If
    /// either is unknown nothing is written. Repeated edges and self-follows
    /// are accepted.
    #[instrument(skip(self))]
    pub fn follow(&self, follower: &str, following: &str) -> Result<FollowEdge, StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let follower_id = require_id(&tx, follower)?;
            let following_id = require_id(&tx, following)?;

            tx.execute(
                "INSERT INTO followers (follower_id, following_id) VALUES (?1, ?2)",
                rusqlite::params![follower_id.get(), following_id.get()],
            )?;
            tx.commit()?;

            info!(follower, following, "follow edge added");
            Ok(FollowEdge {
                follower_id,
                following_id,
            })
        })
    }

    /// Usernames of everyone following `username`, in edge order.
    /// Empty when the user has no followers or does not exist.
    #[instrument(skip(self))]
    pub fn followers(&self, username: &str) -> Result<Vec<String>, StoreError> {
        self.usernames(
            "SELECT u.username FROM followers f
             JOIN users u ON f.follower_id = u.id
             JOIN users target ON f.following_id = target.id
             WHERE target.username = ?1
             ORDER BY f.rowid",
            username,
        )
    }

    /// Usernames that `username` follows, in edge order.
    /// Empty when the user follows nobody or does not exist.
    #[instrument(skip(self))]
    pub fn following(&self, username: &str) -> Result<Vec<String>, StoreError> {
        self.usernames(
            "SELECT u.username FROM followers f
             JOIN users u ON f.following_id = u.id
             JOIN users source ON f.follower_id = source.id
             WHERE source.username = ?1
             ORDER BY f.rowid",
            username,
        )
    }

    fn usernames(&self, sql: &str, username: &str) -> Result<Vec<String>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query([username])?;
            let mut names = Vec::new();
            while let Some(row) = rows.next()? {
                names.push(row_helpers::get(row, 0, "users", "username")?);
            }
            Ok(names)
        })
    }
}
