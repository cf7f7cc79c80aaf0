use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use parley_core::ids::StatusId;
use parley_core::timestamp;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;
use crate::users::require_id;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRow {
    pub id: StatusId,
    pub author: String,
    pub content: String,
    #[serde(with = "parley_core::timestamp::serde_format")]
    pub created_at: NaiveDateTime,
}

#[derive(Clone)]
pub struct StatusRepo {
    db: Database,
}

const SELECT_STATUSES: &str = "SELECT s.id, u.username, s.content, s.created_at
     FROM statuses s
     JOIN users u ON s.user_id = u.id";

impl StatusRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Post a status stamped with the current local time.
    pub fn post(&self, username: &str, content: &str) -> Result<StatusRow, StoreError> {
        self.post_at(username, content, timestamp::now())
    }

    /// Post a status with an explicit creation time.
    /// Fails with `UserNotFound` if the author is unknown; nothing is written.
    #[instrument(skip(self, content, created_at), fields(created_at = %created_at))]
    pub fn post_at(
        &self,
        username: &str,
        content: &str,
        created_at: NaiveDateTime,
    ) -> Result<StatusRow, StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let user_id = require_id(&tx, username)?;

            tx.execute(
                "INSERT INTO statuses (user_id, content, created_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id.get(), content, timestamp::format(&created_at)],
            )?;
            let id = StatusId::from_raw(tx.last_insert_rowid());
            tx.commit()?;

            info!(status_id = %id, username, "status posted");
            Ok(StatusRow {
                id,
                author: username.to_string(),
                content: content.to_string(),
                created_at,
            })
        })
    }

    /// A user's statuses, most recent first. Empty for an unknown user.
    #[instrument(skip(self))]
    pub fn for_user(&self, username: &str) -> Result<Vec<StatusRow>, StoreError> {
        self.query(
            &format!("{SELECT_STATUSES} WHERE u.username = ?1 ORDER BY s.created_at DESC, s.id DESC"),
            rusqlite::params![username],
        )
    }

    /// Every status from every user, most recent first.
    #[instrument(skip(self))]
    pub fn all(&self) -> Result<Vec<StatusRow>, StoreError> {
        self.query(
            &format!("{SELECT_STATUSES} ORDER BY s.created_at DESC, s.id DESC"),
            rusqlite::params![],
        )
    }

    fn query(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::types::ToSql],
    ) -> Result<Vec<StatusRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query(params)?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_status(row)?);
            }
            Ok(results)
        })
    }
}

fn row_to_status(row: &rusqlite::Row<'_>) -> Result<StatusRow, StoreError> {
    let raw_created: String = row_helpers::get(row, 3, "statuses", "created_at")?;
    Ok(StatusRow {
        id: StatusId::from_raw(row_helpers::get(row, 0, "statuses", "id")?),
        author: row_helpers::get(row, 1, "users", "username")?,
        content: row_helpers::get(row, 2, "statuses", "content")?,
        created_at: row_helpers::parse_timestamp(&raw_created, "statuses", "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::UserRepo;
    use chrono::NaiveDate;

    fn setup(names: &[&str]) -> (Database, StatusRepo) {
        let db = Database::in_memory().unwrap();
        let users = UserRepo::new(db.clone());
        for name in names {
            users.register(name).unwrap();
        }
        (db.clone(), StatusRepo::new(db))
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn post_then_list_returns_it_first() {
        let (_, repo) = setup(&["leia"]);
        repo.post("leia", "older").unwrap();
        repo.post("leia", "hi").unwrap();

        let statuses = repo.for_user("leia").unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].content, "hi");
        assert_eq!(statuses[0].author, "leia");
    }

    #[test]
    fn post_stamps_current_second() {
        let (_, repo) = setup(&["leia"]);
        let before = timestamp::now();
        let posted = repo.post("leia", "hi").unwrap();
        let after = timestamp::now();
        assert!(before <= posted.created_at && posted.created_at <= after);

        let listed = repo.for_user("leia").unwrap();
        assert_eq!(listed[0], posted);
    }

    #[test]
    fn ordered_by_created_at_not_insertion() {
        let (_, repo) = setup(&["han"]);
        repo.post_at("han", "noon", at(12, 0, 0)).unwrap();
        repo.post_at("han", "morning", at(9, 0, 0)).unwrap();
        repo.post_at("han", "evening", at(18, 0, 0)).unwrap();

        let contents: Vec<String> = repo.for_user("han").unwrap().into_iter().map(|s| s.content).collect();
        assert_eq!(contents, ["evening", "noon", "morning"]);
    }

    #[test]
    fn same_second_ties_favor_later_insert() {
        let (_, repo) = setup(&["han"]);
        repo.post_at("han", "first", at(8, 0, 0)).unwrap();
        repo.post_at("han", "second", at(8, 0, 0)).unwrap();

        let contents: Vec<String> = repo.for_user("han").unwrap().into_iter().map(|s| s.content).collect();
        assert_eq!(contents, ["second", "first"]);
    }

    #[test]
    fn unknown_author_writes_nothing() {
        let (db, repo) = setup(&[]);
        let err = repo.post("ghost", "boo").unwrap_err();
        assert!(matches!(err, StoreError::UserNotFound(ref name) if name == "ghost"));
        assert_eq!(db.row_count("statuses").unwrap(), 0);
    }

    #[test]
    fn for_user_filters_by_author() {
        let (_, repo) = setup(&["luke", "leia"]);
        repo.post("luke", "May the Force be with you.").unwrap();
        repo.post("leia", "Hope will never die.").unwrap();

        let leia = repo.for_user("leia").unwrap();
        assert_eq!(leia.len(), 1);
        assert_eq!(leia[0].content, "Hope will never die.");
        assert!(repo.for_user("ghost").unwrap().is_empty());
    }

    #[test]
    fn all_spans_authors_newest_first() {
        let (_, repo) = setup(&["luke", "leia", "han"]);
        repo.post_at("luke", "a", at(10, 0, 0)).unwrap();
        repo.post_at("leia", "b", at(11, 0, 0)).unwrap();
        repo.post_at("han", "c", at(9, 30, 0)).unwrap();

        let authors: Vec<String> = repo.all().unwrap().into_iter().map(|s| s.author).collect();
        assert_eq!(authors, ["leia", "luke", "han"]);
    }

    #[test]
    fn stored_text_uses_second_format() {
        let (db, repo) = setup(&["leia"]);
        repo.post_at("leia", "hi", at(7, 8, 9)).unwrap();
        let raw: String = db
            .with_conn(|conn| Ok(conn.query_row("SELECT created_at FROM statuses", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(raw, "2026-05-04 07:08:09");
    }

    #[test]
    fn serializes_created_at_in_storage_format() {
        let (_, repo) = setup(&["leia"]);
        let row = repo.post_at("leia", "hi", at(7, 8, 9)).unwrap();
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["created_at"], "2026-05-04 07:08:09");
        assert_eq!(json["author"], "leia");
    }
}
