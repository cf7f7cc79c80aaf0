pub mod ids;
pub mod timestamp;

pub use ids::{MessageId, StatusId, UserId};
