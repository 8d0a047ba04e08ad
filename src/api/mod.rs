//! HTTP API server for the BaatGPT assistant

pub mod health;
pub mod page;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::assistant::Assistant;
use crate::session::SessionStore;

/// Largest accepted upload, matching the transcription API's file limit
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<Assistant>,
    pub sessions: SessionStore,
}

impl ApiState {
    #[must_use]
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self {
            assistant,
            sessions: SessionStore::new(),
        }
    }
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    assistant: Arc<Assistant>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub const fn new(assistant: Arc<Assistant>, port: u16) -> Self {
        Self {
            assistant,
            port,
            static_dir: None,
        }
    }

    /// Set the static files directory for serving a custom page
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState::new(self.assistant)),
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let router = Router::new()
            .nest("/api/voice", voice::router(self.state.clone()))
            .merge(health::router(self.state.clone()));

        // Serve static files if configured, otherwise the embedded page
        let router = if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir =
                ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

            tracing::info!(path = %static_dir.display(), "serving static files");
            router.fallback_service(serve_dir)
        } else {
            router.merge(page::router())
        };

        // CORS layer for cross-origin requests from a separately hosted page
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);

        router
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
