// @zen-component: COACH-RequestGuard
//
//! Coach request parsing and the boundary shape guard.
//!
//! Requests are rejected, never repaired: a body lacking either top-level
//! field or carrying a malformed snapshot never reaches the prompt builder.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::snapshot::Snapshot;

/// Snapshot leaves that must be present and numeric before anything else is
/// looked at.
const REQUIRED_NUMERIC_FIELDS: [&str; 4] = [
    "/readiness",
    "/sleep/durationHrs",
    "/recovery/score",
    "/workload/completed",
];

/// Request validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing message or dataSnapshot")]
    MissingFields,

    #[error("Invalid dataSnapshot shape")]
    InvalidSnapshot,
}

/// A validated coaching request.
#[derive(Debug, Clone, PartialEq)]
pub struct CoachRequest {
    /// Caller's question, reproduced verbatim in the prompt.
    pub message: String,
    pub data_snapshot: Snapshot,
}

impl CoachRequest {
    /// Parse a raw request body.
    ///
    /// A body that is not JSON is treated like an empty object, so it fails
    /// with [`RequestError::MissingFields`].
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        let value = serde_json::from_slice(body).unwrap_or(Value::Null);
        Self::from_value(&value)
    }

    /// Validate an already-decoded JSON body.
    pub fn from_value(body: &Value) -> Result<Self, RequestError> {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty());
        let snapshot = body.get("dataSnapshot").filter(|s| is_present(s));

        let (Some(message), Some(snapshot)) = (message, snapshot) else {
            return Err(RequestError::MissingFields);
        };

        if !has_required_shape(snapshot) {
            return Err(RequestError::InvalidSnapshot);
        }

        // The remaining leaves are enforced by the typed model.
        let data_snapshot =
            Snapshot::deserialize(snapshot).map_err(|_| RequestError::InvalidSnapshot)?;

        Ok(Self {
            message: message.to_string(),
            data_snapshot,
        })
    }
}

/// Light structural guard over the four leaves every snapshot must carry.
pub fn has_required_shape(snapshot: &Value) -> bool {
    REQUIRED_NUMERIC_FIELDS
        .iter()
        .all(|pointer| snapshot.pointer(pointer).is_some_and(Value::is_number))
}

/// `null`, `false`, `0` and `""` count as absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
