//! Console variant: runs repository operations directly and prints
//! confirmations and listings.
//!
//! Lookup misses and duplicate registrations are printed as warnings and the
//! run continues; storage failures abort.

use std::io::Write;

use parley_core::timestamp;
use parley_store::{Database, FollowRepo, MessageRepo, StatusRepo, StoreError, UserRepo};

pub struct Console<W: Write> {
    users: UserRepo,
    follows: FollowRepo,
    statuses: StatusRepo,
    messages: MessageRepo,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(db: Database, out: W) -> Self {
        Self {
            users: UserRepo::new(db.clone()),
            follows: FollowRepo::new(db.clone()),
            statuses: StatusRepo::new(db.clone()),
            messages: MessageRepo::new(db),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    pub fn register_user(&mut self, username: &str) -> anyhow::Result<()> {
        match self.users.register(username) {
            Ok(_) => writeln!(self.out, "User '{username}' registered.")?,
            Err(StoreError::DuplicateUser(_)) => self.warn("Username already exists.")?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn follow(&mut self, follower: &str, following: &str) -> anyhow::Result<()> {
        match self.follows.follow(follower, following) {
            Ok(_) => writeln!(self.out, "{follower} is now following {following}")?,
            Err(StoreError::UserNotFound(_)) => self.warn("One or both users do not exist.")?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn show_followers(&mut self, username: &str) -> anyhow::Result<()> {
        let followers = self.follows.followers(username)?;
        writeln!(
            self.out,
            "{username}'s followers ({}): {}",
            followers.len(),
            followers.join(", ")
        )?;
        Ok(())
    }

    pub fn show_following(&mut self, username: &str) -> anyhow::Result<()> {
        let following = self.follows.following(username)?;
        writeln!(
            self.out,
            "{username} is following ({}): {}",
            following.len(),
            following.join(", ")
        )?;
        Ok(())
    }

    pub fn post_status(&mut self, username: &str, content: &str) -> anyhow::Result<()> {
        match self.statuses.post(username, content) {
            Ok(_) => writeln!(self.out, "{username} posted a new status.")?,
            Err(StoreError::UserNotFound(_)) => self.warn(&format!("User '{username}' does not exist."))?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn show_statuses(&mut self, username: &str) -> anyhow::Result<()> {
        let statuses = self.statuses.for_user(username)?;
        writeln!(self.out, "\n{username}'s status updates:")?;
        for status in statuses {
            writeln!(
                self.out,
                "- {} ({})",
                status.content,
                timestamp::format(&status.created_at)
            )?;
        }
        Ok(())
    }

    pub fn send_message(&mut self, sender: &str, receiver: &str, content: &str) -> anyhow::Result<()> {
        match self.messages.send(sender, receiver, content) {
            Ok(_) => writeln!(self.out, "Message sent from {sender} to {receiver}.")?,
            Err(StoreError::UserNotFound(_)) => self.warn("Invalid users.")?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub fn view_inbox(&mut self, username: &str) -> anyhow::Result<()> {
        let messages = self.messages.inbox(username)?;
        writeln!(self.out, "\nInbox for {username}:")?;
        for message in messages {
            writeln!(
                self.out,
                "From {}: {} ({})",
                message.sender,
                message.content,
                timestamp::format(&message.sent_at)
            )?;
        }
        Ok(())
    }

    fn warn(&mut self, text: &str) -> std::io::Result<()> {
        tracing::warn!(warning = text, "console operation skipped");
        writeln!(self.out, "Warning: {text}")
    }
}

/// The fixed demo sequence.
pub fn run_demo<W: Write>(db: Database, out: W) -> anyhow::Result<W> {
    let mut console = Console::new(db, out);

    for name in ["luke", "leia", "han"] {
        console.register_user(name)?;
    }

    console.follow("luke", "leia")?;
    console.follow("leia", "han")?;
    console.follow("han", "luke")?;

    console.show_followers("luke")?;
    console.show_following("leia")?;

    console.post_status("luke", "May the Force be with you.")?;
    console.post_status("leia", "Hope will never die.")?;
    console.post_status("han", "Never tell me the odds.")?;

    console.show_statuses("leia")?;

    console.send_message("luke", "leia", "Hey, how's the rebellion?")?;
    console.send_message("leia", "luke", "Still fighting. You?")?;
    console.send_message("han", "luke", "You owe me a drink.")?;

    console.view_inbox("luke")?;

    Ok(console.into_output())
}
