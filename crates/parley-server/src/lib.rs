//! HTTP views over the parley store.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod server;

pub use auth::CurrentUser;
pub use error::{ApiError, ServerError};
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
