// @zen-component: COACH-Handler
//
//! Coach endpoint.
//!
//! `POST /coach` validates the body, resolves the caller and their tenant,
//! builds the prompt and relays the model's streamed reply. `OPTIONS` answers
//! preflight; every other method is rejected without touching the provider.

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use tracing::debug;

use athletiq_core::models::chat::ChatRequest;
use athletiq_core::models::coach::CoachRequest;
use athletiq_core::prompt::{COACH_TEMPERATURE, build_coach_messages};
use athletiq_core::tenant::TenantError;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::services::relay;

/// `POST /coach` — stream coaching advice for a message + snapshot.
pub async fn coach_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let request = CoachRequest::from_slice(&body?)?;
    debug!("coach request validated");

    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let identity = state.identity.resolve(authorization).await?;

    let tenant = state.tenants.resolve_tenant(&identity.subject).await?;
    if tenant.provider != state.provider.kind() {
        return Err(TenantError::UnsupportedProvider(tenant.provider).into());
    }
    let api_key = tenant.credential()?;
    debug!(
        subject = %identity.subject,
        plan = %tenant.plan,
        model = %tenant.model,
        "tenant resolved"
    );

    let messages = build_coach_messages(&request.message, &request.data_snapshot);
    let chat = ChatRequest {
        model: tenant.model.clone(),
        messages: messages.into(),
        temperature: COACH_TEMPERATURE,
    };

    let fragments = state.provider.stream_chat(api_key, chat).await?;
    relay::stream_response(fragments).await
}

/// `OPTIONS /coach` — preflight; permission headers come from the CORS layer.
pub async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Any other method on `/coach`.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
