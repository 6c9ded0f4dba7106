//! Tempo meal tracker backend
//!
//! A REST backend that estimates meal macros with a language model API and
//! keeps the meal log, goals and preferences in flat JSON documents.

mod aggregate;
mod api;
mod auth;
mod config;
mod errors;
mod llm;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, FixedOffset};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use errors::AppError;
use llm::{CompletionClient, MacroEstimator, OpenAiClient, Suggester};
use store::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub estimator: Arc<MacroEstimator>,
    pub suggester: Arc<Suggester>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(repo: Repository, client: Arc<dyn CompletionClient>, config: Config) -> Self {
        Self {
            repo: Arc::new(repo),
            estimator: Arc::new(MacroEstimator::new(client.clone())),
            suggester: Arc::new(Suggester::new(client)),
            config: Arc::new(config),
        }
    }

    /// Current time in the configured zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.config.day_zone.now()
    }

    /// Run a repository call on the blocking pool so file I/O and the store
    /// lock never hold up a runtime worker.
    pub async fn with_repo<T, F>(&self, op: F) -> Result<T, AppError>
    where
        F: FnOnce(&Repository) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let repo = self.repo.clone();
        tokio::task::spawn_blocking(move || op(&repo))
            .await
            .map_err(|e| AppError::Internal(format!("Storage task failed: {}", e)))?
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tempo backend");
    tracing::info!("Data directory: {:?}", config.data_dir);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Day boundaries in {}", config.day_zone);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (TEMPO_API_PSK). Authentication is disabled!");
    }
    if config.llm.api_key.is_none() {
        tracing::warn!(
            "No language model API key configured (TEMPO_LLM_API_KEY). Estimates will fall back to zero macros"
        );
    }

    // Open the documents; a malformed one stops startup
    let repo = Repository::new(&config.data_dir);
    repo.verify()?;

    let client: Arc<dyn CompletionClient> = Arc::new(OpenAiClient::new(config.llm.clone())?);

    // Create application state
    let state = AppState::new(repo, client, config.clone());

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Meals
        .route("/meals", get(api::list_meals))
        .route("/meals", post(api::create_meal))
        .route("/meals/estimate", post(api::estimate_meal))
        .route("/meals/{id}", delete(api::delete_meal))
        .route("/meals/{id}/repeat", post(api::repeat_meal))
        // Aggregates
        .route("/summary", get(api::get_summary))
        .route("/history", get(api::get_history))
        // Settings
        .route("/goals", get(api::get_goals).put(api::put_goals))
        .route(
            "/preferences",
            get(api::get_preferences).put(api::put_preferences),
        )
        .route("/protein-choices", get(api::get_protein_choices))
        .route(
            "/protein-choices/refresh",
            post(api::refresh_protein_choices),
        )
        // Suggestions
        .route("/suggestions/meal", post(api::suggest_meal))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
