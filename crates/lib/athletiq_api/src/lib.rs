//! # athletiq_api
//!
//! HTTP API library for the AthletIQ coach service.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use athletiq_core::identity::firebase::FirebaseVerifier;
use athletiq_core::identity::{FixedSubject, IdentityResolver};
use athletiq_core::provider::ChatProvider;
use athletiq_core::provider::openai::OpenAiChatProvider;
use athletiq_core::tenant::{StaticTenantResolver, TenantResolver};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use tracing::info;

use crate::config::{ApiConfig, ApiConfigError, AuthMode};
use crate::handlers::coach;

/// Route served by the coach handler.
pub const COACH_ROUTE: &str = "/coach";

/// Accepted request body size: 1 MiB.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: ApiConfig,
    /// Caller identity; fixed subject or verified token per `AUTH_MODE`.
    pub identity: Arc<dyn IdentityResolver>,
    pub tenants: Arc<dyn TenantResolver>,
    /// Streaming LLM backend.
    pub provider: Arc<dyn ChatProvider>,
}

impl AppState {
    /// Wire the production collaborators described by `config`.
    pub fn from_config(config: ApiConfig) -> Result<Self, ApiConfigError> {
        let identity: Arc<dyn IdentityResolver> = match &config.auth_mode {
            AuthMode::Fixed { subject } => {
                info!(%subject, "identity verification disabled, using fixed subject");
                Arc::new(FixedSubject::new(subject.clone()))
            }
            AuthMode::Firebase => Arc::new(FirebaseVerifier::from_env()),
        };
        let tenants = Arc::new(StaticTenantResolver::new(
            &config.plan,
            &config.model,
            config.openai_api_key.clone(),
        ));
        let provider = OpenAiChatProvider::new(&config.openai_base_url)
            .map_err(|e| ApiConfigError::InvalidBaseUrl(e.to_string()))?;

        Ok(Self {
            identity,
            tenants,
            provider: Arc::new(provider),
            config,
        })
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route(
            COACH_ROUTE,
            post(coach::coach_handler)
                .options(coach::preflight_handler)
                .fallback(coach::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    middleware::cors::with_cors(routes)
}
