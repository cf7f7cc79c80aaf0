use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use parley_store::StoreError;
use serde_json::json;

use crate::paths;

/// Errors a view can return; each knows its HTTP presentation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated { login_url: String, next: String },

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("username already exists: {0}")]
    DuplicateUser(String),

    #[error("username must not be empty")]
    InvalidUsername,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(name) => Self::UserNotFound(name),
            StoreError::DuplicateUser(name) => Self::DuplicateUser(name),
            StoreError::InvalidUsername => Self::InvalidUsername,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthenticated { login_url, next } => {
                return Redirect::to(&paths::login_redirect(login_url, next)).into_response();
            }
            Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateUser(_) => StatusCode::CONFLICT,
            Self::InvalidUsername => StatusCode::BAD_REQUEST,
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match self {
            Self::Internal(_) => status.canonical_reason().unwrap_or("error").to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Failures while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid auth header name: {0}")]
    InvalidAuthHeader(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_api_errors() {
        assert!(matches!(
            ApiError::from(StoreError::UserNotFound("x".into())),
            ApiError::UserNotFound(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::DuplicateUser("x".into())),
            ApiError::DuplicateUser(_)
        ));
        assert!(matches!(
            ApiError::from(StoreError::Database("boom".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::UserNotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::DuplicateUser("x".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::InvalidUsername.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("disk full".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let resp = ApiError::Unauthenticated {
            login_url: "/accounts/login/".into(),
            next: "/inbox/".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers()[axum::http::header::LOCATION],
            "/accounts/login/?next=/inbox/"
        );
    }
}
