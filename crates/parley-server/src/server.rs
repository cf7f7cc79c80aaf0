use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderName;
use axum::routing::{get, post};
use axum::Router;
use parley_store::Database;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::auth::AuthSettings;
use crate::error::ServerError;
use crate::handlers;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request header carrying the upstream-authenticated username.
    pub auth_header: String,
    /// Where unauthenticated requests to protected views are sent.
    pub login_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            auth_header: "x-remote-user".to_string(),
            login_url: "/accounts/login/".to_string(),
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(db: Database, config: &ServerConfig) -> Result<Self, ServerError> {
        let header = HeaderName::from_bytes(config.auth_header.as_bytes())
            .map_err(|_| ServerError::InvalidAuthHeader(config.auth_header.clone()))?;
        Ok(Self {
            db,
            auth: Arc::new(AuthSettings {
                header,
                login_url: config.login_url.clone(),
            }),
        })
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route(
            "/post/",
            get(handlers::post_status_form).post(handlers::post_status),
        )
        .route("/inbox/", get(handlers::inbox))
        .route(
            "/message/{username}/",
            get(handlers::send_message_form).post(handlers::send_message),
        )
        .route("/follow/{username}/", post(handlers::follow))
        .route("/users/{username}/statuses/", get(handlers::user_statuses))
        .route("/users/{username}/followers/", get(handlers::user_followers))
        .route("/users/{username}/following/", get(handlers::user_following))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind and start serving in a background task.
pub async fn start(config: ServerConfig, db: Database) -> Result<ServerHandle, ServerError> {
    let state = AppState::new(db, &config)?;
    let router = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "parley server started");

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await;
        if let Err(e) = result {
            tracing::error!(error = %e, "server stopped");
        }
    });

    Ok(ServerHandle {
        addr: local_addr,
        cancel,
        server,
    })
}

/// Handle returned by `start()`; the server runs until `shutdown` or drop of
/// the runtime.
pub struct ServerHandle {
    pub addr: SocketAddr,
    cancel: CancellationToken,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.server.await {
            tracing::error!(error = %e, "server task failed");
        }
        tracing::info!(addr = %self.addr, "parley server stopped");
    }
}
