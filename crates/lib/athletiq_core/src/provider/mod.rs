// @zen-component: COACH-ChatProvider
//
//! Streaming chat-completion providers.
//!
//! A provider turns a [`ChatRequest`] into a [`FragmentStream`] of text
//! fragments in the order the model emitted them. Providers are called once
//! per request; nothing here retries.

pub mod openai;

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use thiserror::Error;

use crate::models::chat::ChatRequest;

/// Incremental model output. Ends after the provider signals completion;
/// providers end it right after the first `Err` item.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while opening or reading a provider stream.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Request(String),

    #[error("Provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Provider stream error: {0}")]
    Stream(String),

    #[error("Provider sent an unreadable chunk: {0}")]
    Decode(String),

    #[error("Provider error: {0}")]
    Upstream(String),
}

/// A streaming chat-completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Which provider this is; tenants must name the same kind.
    fn kind(&self) -> ProviderKind;

    /// Open a streaming completion using the tenant's credential.
    async fn stream_chat(
        &self,
        api_key: &str,
        request: ChatRequest,
    ) -> Result<FragmentStream, ProviderError>;
}
