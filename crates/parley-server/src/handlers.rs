//! Views. Mutating views answer with a redirect, listings with JSON.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use parley_store::{FollowRepo, MessageRepo, StatusRepo, UserRepo};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::paths;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ContentForm {
    #[serde(default)]
    pub content: String,
}

// GET /
pub async fn home(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let statuses = StatusRepo::new(state.db.clone()).all()?;
    Ok(Json(json!({ "statuses": statuses })))
}

// GET /post/
pub async fn post_status_form(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "user": user.username, "fields": ["content"] }))
}

// POST /post/
pub async fn post_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ContentForm>,
) -> Result<Redirect, ApiError> {
    StatusRepo::new(state.db.clone()).post(&user.username, &form.content)?;
    Ok(Redirect::to("/"))
}

// GET /inbox/
pub async fn inbox(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let messages = MessageRepo::new(state.db.clone()).inbox(&user.username)?;
    Ok(Json(json!({ "user": user.username, "messages": messages })))
}

// GET /message/{username}/
pub async fn send_message_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let receiver = UserRepo::new(state.db.clone()).get_by_username(&username)?;
    Ok(Json(json!({
        "sender": user.username,
        "receiver": receiver.username,
        "fields": ["content"],
    })))
}

// POST /message/{username}/
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
    Form(form): Form<ContentForm>,
) -> Result<Redirect, ApiError> {
    MessageRepo::new(state.db.clone()).send(&user.username, &username, &form.content)?;
    Ok(Redirect::to("/inbox/"))
}

// POST /follow/{username}/
pub async fn follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(username): Path<String>,
) -> Result<Redirect, ApiError> {
    FollowRepo::new(state.db.clone()).follow(&user.username, &username)?;
    Ok(Redirect::to(&paths::user_followers(&username)))
}

// GET /users/{username}/statuses/
pub async fn user_statuses(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = UserRepo::new(state.db.clone()).get_by_username(&username)?;
    let statuses = StatusRepo::new(state.db.clone()).for_user(&user.username)?;
    Ok(Json(json!({ "user": user.username, "statuses": statuses })))
}

// GET /users/{username}/followers/
pub async fn user_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = UserRepo::new(state.db.clone()).get_by_username(&username)?;
    let followers = FollowRepo::new(state.db.clone()).followers(&user.username)?;
    Ok(Json(json!({ "user": user.username, "followers": followers })))
}

// GET /users/{username}/following/
pub async fn user_following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = UserRepo::new(state.db.clone()).get_by_username(&username)?;
    let following = FollowRepo::new(state.db.clone()).following(&user.username)?;
    Ok(Json(json!({ "user": user.username, "following": following })))
}

// GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping() {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "healthy" }))),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
