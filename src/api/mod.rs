//! HTTP API server for the voice relay

pub mod health;
pub mod relay;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::config::Config;
use crate::pipeline::Pipeline;

/// Shared state for API handlers
pub struct ApiState {
    /// The three-stage orchestrator
    pub pipeline: Arc<Pipeline>,
    /// Language assumed when the request does not specify one
    pub default_language: String,
    /// Allow-listed MIME types for inbound audio
    pub allowed_mime_types: Vec<String>,
    /// Model identifiers reported in metadata when a stage left them unset
    pub stt_model: String,
    pub reasoning_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub tts_format: String,
}

impl ApiState {
    /// Build API state from configuration and a ready pipeline
    #[must_use]
    pub fn new(config: &Config, pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            default_language: config.interaction.default_language.clone(),
            allowed_mime_types: config.interaction.allowed_mime_types.clone(),
            stt_model: config.provider.stt_model.clone(),
            reasoning_model: config.provider.reasoning_model.clone(),
            tts_model: config.provider.tts_model.clone(),
            tts_voice: config.provider.tts_voice.clone(),
            tts_format: config.provider.tts_format.clone(),
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server for the given state and port
    #[must_use]
    pub const fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(state: Arc<ApiState>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(health::router())
            .merge(relay::router(state))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run.
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
