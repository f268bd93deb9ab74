//! Directory-backed single sign-on HTTP API.
//!
//! Provides an Axum-based HTTP server with:
//! - Login against the directory (`/api/auth/login`, `/login`)
//! - User attribute lookup (`/api/user/:username`, `/user/:username`)
//! - Health endpoint

pub mod api;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use sysadmin_core::directory::DirectoryService;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub directory: Arc<dyn DirectoryService>,
}

/// Build the application router with its middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(api::status::routes())
        .merge(api::auth::routes())
        .merge(api::user::routes())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// The web server.
pub struct WebServer {
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(directory: Arc<dyn DirectoryService>) -> Self {
        Self {
            state: Arc::new(AppState { directory }),
        }
    }

    /// Serve on `listen_addr` until `shutdown` resolves.
    pub async fn start<F>(self, listen_addr: &str, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listen_addr.parse()?;
        let app = router(self.state);

        info!(addr = %addr, "starting web server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("web server stopped");
        Ok(())
    }
}
