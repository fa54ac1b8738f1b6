// @zen-component: COACH-TenantResolver
//
//! Tenant configuration resolution.
//!
//! A tenant is the billing/configuration scope of a verified subject. The
//! only resolver today is [`StaticTenantResolver`]; a per-tenant store plugs
//! in behind [`TenantResolver`] without touching the handler.

use async_trait::async_trait;
use thiserror::Error;

use crate::provider::ProviderKind;

/// Tenant resolution errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TenantError {
    #[error("Missing provider credential")]
    MissingCredential,

    #[error("Unsupported provider for tenant: {0}")]
    UnsupportedProvider(ProviderKind),
}

/// Per-tenant plan and LLM settings.
#[derive(Clone, PartialEq, Eq)]
pub struct TenantConfig {
    pub plan: String,
    pub provider: ProviderKind,
    /// Model identifier passed to the provider.
    pub model: String,
    pub api_key: Option<String>,
}

impl TenantConfig {
    /// The provider credential, if one is usable.
    pub fn credential(&self) -> Result<&str, TenantError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(TenantError::MissingCredential)
    }
}

impl std::fmt::Debug for TenantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantConfig")
            .field("plan", &self.plan)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Looks up the tenant configuration for a verified subject.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    async fn resolve_tenant(&self, subject: &str) -> Result<TenantConfig, TenantError>;
}

/// Every subject maps to the same plan, provider, model and credential.
#[derive(Debug, Clone)]
pub struct StaticTenantResolver {
    config: TenantConfig,
}

impl StaticTenantResolver {
    pub fn new(plan: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            config: TenantConfig {
                plan: plan.to_string(),
                provider: ProviderKind::OpenAi,
                model: model.to_string(),
                api_key,
            },
        }
    }
}

#[async_trait]
impl TenantResolver for StaticTenantResolver {
    async fn resolve_tenant(&self, _subject: &str) -> Result<TenantConfig, TenantError> {
        Ok(self.config.clone())
    }
}
