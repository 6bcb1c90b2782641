//! HTTP API server for the fable gateway
//!
//! Exposes the running game to local frontends: chat turns, restart,
//! transcripts, scene images, and spoken narration.

pub mod game;
pub mod health;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::images::ImageProvider;
use crate::session::GameSession;
use crate::voice::Speaker;
use crate::{Error, Result};

/// Shared state for API handlers
pub struct ApiState {
    /// The running game, one per gateway process
    pub session: Mutex<GameSession>,

    /// Scene image backend, when configured
    pub images: Option<Arc<dyn ImageProvider>>,

    /// Narration output, when voice is enabled
    pub speaker: Option<Mutex<Speaker>>,

    /// Chat backend name, for status reporting
    pub chat_backend: &'static str,

    /// Image backend name, for status reporting
    pub image_backend: Option<&'static str>,
}

/// HTTP server exposing the game API
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server over the given state
    #[must_use]
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state: Arc::new(state),
            port,
        }
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let router = Router::new()
            .merge(health::router())
            .merge(health::status_router(self.state.clone()))
            .merge(game::router(self.state.clone()));

        // CORS layer for cross-origin requests from a browser frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
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
            .map_err(|e| Error::Api(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| Error::Api(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
