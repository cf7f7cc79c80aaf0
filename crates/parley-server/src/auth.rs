//! The authenticated principal.
//!
//! Authentication happens upstream (a reverse proxy or SSO gateway). It
//! forwards the username in a configured header; views that require a
//! principal take a [`CurrentUser`] argument.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderName;
use parley_store::{UserRepo, UserRow};

use crate::error::ApiError;
use crate::server::AppState;

/// Where the principal comes from and where to send requests without one.
#[derive(Clone, Debug)]
pub struct AuthSettings {
    pub header: HeaderName,
    pub login_url: String,
}

/// The user the upstream authenticator vouched for.
///
/// The user row is provisioned on first sight. A request without the header
/// is rejected with a redirect to the login entry point.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserRow);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(&state.auth.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let Some(username) = username else {
            tracing::debug!(path = parts.uri.path(), "unauthenticated request");
            return Err(ApiError::Unauthenticated {
                login_url: state.auth.login_url.clone(),
                next: parts.uri.path().to_string(),
            });
        };

        let user = UserRepo::new(state.db.clone()).get_or_register(username)?;
        Ok(CurrentUser(user))
    }
}
