//! HTTP request handlers for the Tierroute API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::execution::Executor;
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::models::CompletionClient;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod execute;
pub mod extractor;
pub mod health;
pub mod metrics;
pub mod request;
pub mod route;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    executor: Arc<Executor>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create application state from configuration and a completion client
    ///
    /// # Errors
    /// Returns an error if the execution policy is invalid or metrics
    /// registration fails.
    pub fn new(config: Arc<Config>, client: Arc<dyn CompletionClient>) -> AppResult<Self> {
        let metrics = Arc::new(Metrics::new().map_err(|e| {
            AppError::Internal(format!("Failed to initialize metrics: {}", e))
        })?);
        let executor = Executor::from_config(&config, client)?.with_metrics(metrics.clone());

        Ok(Self {
            config,
            executor: Arc::new(executor),
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the API router
///
/// Layers run outermost first: request ID assignment, then HTTP tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .route("/v1/route", post(route::handler))
        .route("/v1/execute", post(execute::handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
