// @zen-component: COACH-StreamRelay
//
//! Relays provider fragments to the caller as a raw text event stream.
//!
//! The response is committed only once the provider has produced its first
//! non-empty fragment (or finished without one). Up to that point a failure
//! is still reported as a JSON error; after it, a failure ends the body
//! early and the caller sees a truncated stream.

use axum::body::Body;
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::response::Response;
use futures_util::{StreamExt, TryStreamExt, future, stream};
use tracing::{debug, warn};

use athletiq_core::provider::{FragmentStream, ProviderError};

use crate::error::{AppError, AppResult};

pub const EVENT_STREAM: &str = "text/event-stream";

/// Turn a provider stream into a committed `200` streaming response.
///
/// Fragments are written unbuffered and in provider order; empty fragments
/// are dropped and the body ends at the first provider error.
pub async fn stream_response(mut fragments: FragmentStream) -> AppResult<Response> {
    let first = loop {
        match fragments.next().await {
            Some(Ok(text)) if text.is_empty() => {}
            Some(Ok(text)) => break Some(text),
            Some(Err(e)) => return Err(e.into()),
            None => break None,
        }
    };

    debug!(empty = first.is_none(), "committing event stream");

    let body = stream::iter(first.map(Ok::<_, ProviderError>))
        .chain(fragments.try_filter(|text| future::ready(!text.is_empty())))
        .inspect_err(|e| warn!("provider stream failed mid-response, truncating: {e}"))
        // Nothing is forwarded after the first error.
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        });

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, EVENT_STREAM)
        .header(CACHE_CONTROL, "no-cache, no-transform")
        .header(CONNECTION, "keep-alive")
        .body(Body::from_stream(body))
        .map_err(|e| AppError::Internal(format!("Response build failed: {e}")))
}
