use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use parley_core::ids::MessageId;
use parley_core::timestamp;

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;
use crate::users::require_id;

/// A direct message with both parties resolved to usernames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: MessageId,
    pub sender: String,
    pub receiver: String,
    pub content: String,
    #[serde(with = "parley_core::timestamp::serde_format")]
    pub sent_at: NaiveDateTime,
}

#[derive(Clone)]
pub struct MessageRepo {
    db: Database,
}

impl MessageRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Send a message stamped with the current local time.
    pub fn send(&self, sender: &str, receiver: &str, content: &str) -> Result<MessageRow, StoreError> {
        self.send_at(sender, receiver, content, timestamp::now())
    }

    /// Send a message with an explicit timestamp.
    /// Both parties are resolved in the insert's transaction; if either is
    /// unknown nothing is written.
    #[instrument(skip(self, content, sent_at), fields(sent_at = %sent_at))]
    pub fn send_at(
        &self,
        sender: &str,
        receiver: &str,
        content: &str,
        sent_at: NaiveDateTime,
    ) -> Result<MessageRow, StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let sender_id = require_id(&tx, sender)?;
            let receiver_id = require_id(&tx, receiver)?;

            tx.execute(
                "INSERT INTO messages (sender_id, receiver_id, content, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    sender_id.get(),
                    receiver_id.get(),
                    content,
                    timestamp::format(&sent_at),
                ],
            )?;
            let id = MessageId::from_raw(tx.last_insert_rowid());
            tx.commit()?;

            info!(message_id = %id, sender, receiver, "message sent");
            Ok(MessageRow {
                id,
                sender: sender.to_string(),
                receiver: receiver.to_string(),
                content: content.to_string(),
                sent_at,
            })
        })
    }

    /// Messages addressed to `username`, most recent first.
    /// Empty for an unknown user.
    #[instrument(skip(self))]
    pub fn inbox(&self, username: &str) -> Result<Vec<MessageRow>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, s.username, r.username, m.content, m.timestamp
                 FROM messages m
                 JOIN users s ON m.sender_id = s.id
                 JOIN users r ON m.receiver_id = r.id
                 WHERE r.username = ?1
                 ORDER BY m.timestamp DESC, m.id DESC",
            )?;
            let mut rows = stmt.query([username])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_message(row)?);
            }
            Ok(results)
        })
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<MessageRow, StoreError> {
    let raw_sent: String = row_helpers::get(row, 4, "messages", "timestamp")?;
    Ok(MessageRow {
        id: MessageId::from_raw(row_helpers::get(row, 0, "messages", "id")?),
        sender: row_helpers::get(row, 1, "users", "username")?,
        receiver: row_helpers::get(row, 2, "users", "username")?,
        content: row_helpers::get(row, 3, "messages", "content")?,
        sent_at: row_helpers::parse_timestamp(&raw_sent, "messages", "timestamp")?,
    })
}
