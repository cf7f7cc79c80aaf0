pub mod database;
pub mod error;
pub mod follows;
pub mod messages;
pub mod row_helpers;
pub mod schema;
pub mod statuses;
pub mod users;

pub use database::Database;
pub use error::StoreError;
pub use follows::{FollowEdge, FollowRepo};
pub use messages::{MessageRepo, MessageRow};
pub use statuses::{StatusRepo, StatusRow};
pub use users::{UserRepo, UserRow};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luke_and_leia_scenario() {
        let db = Database::in_memory().unwrap();
        let users = UserRepo::new(db.clone());
        let follows = FollowRepo::new(db.clone());
        let statuses = StatusRepo::new(db.clone());
        let messages = MessageRepo::new(db);

        users.register("luke").unwrap();
        users.register("leia").unwrap();
        follows.follow("luke", "leia").unwrap();
        statuses.post("leia", "hi").unwrap();

        let leia_statuses = statuses.for_user("leia").unwrap();
        assert_eq!(leia_statuses.len(), 1);
        assert_eq!(leia_statuses[0].content, "hi");

        messages.send("luke", "leia", "yo").unwrap();
        let inbox = messages.inbox("leia").unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!((inbox[0].sender.as_str(), inbox[0].content.as_str()), ("luke", "yo"));

        assert_eq!(follows.followers("leia").unwrap(), ["luke"]);
        assert!(follows.following("leia").unwrap().is_empty());
    }
}
