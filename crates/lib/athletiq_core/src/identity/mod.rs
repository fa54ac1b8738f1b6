// @zen-component: COACH-IdentityResolver
//
//! Caller identity resolution.
//!
//! The handler only ever talks to [`IdentityResolver`]. Which variant runs is
//! a configuration choice:
//!
//! - [`FixedSubject`]: every request resolves to one configured subject
//!   (local development, tests).
//! - [`firebase::FirebaseVerifier`]: verifies `Authorization: Bearer <id token>`
//!   against the identity provider.

pub mod firebase;

use async_trait::async_trait;
use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Missing or malformed token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// A caller whose identity has been established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Unique subject identifier; keys tenant resolution.
    pub subject: String,
    pub email: Option<String>,
}

impl VerifiedIdentity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
        }
    }
}

/// Resolves the caller from the raw `Authorization` header value.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, authorization: Option<&str>) -> Result<VerifiedIdentity, IdentityError>;
}

/// Resolves every request to the same subject, ignoring credentials.
#[derive(Debug, Clone)]
pub struct FixedSubject {
    subject: String,
}

impl FixedSubject {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl IdentityResolver for FixedSubject {
    async fn resolve(&self, _authorization: Option<&str>) -> Result<VerifiedIdentity, IdentityError> {
        Ok(VerifiedIdentity::new(self.subject.clone()))
    }
}

/// Extract the credential from a `Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, IdentityError> {
    authorization
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(IdentityError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_subject_ignores_header() {
        let resolver = FixedSubject::new("dev");
        for header in [None, Some("Bearer abc"), Some("garbage")] {
            let identity = resolver.resolve(header).await.expect("identity");
            assert_eq!(identity.subject, "dev");
        }
    }

    #[test]
    fn bearer_token_extracts_credential() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_missing_or_other_schemes() {
        for header in [None, Some(""), Some("Basic dXNlcjpwYXNz"), Some("bearer abc"), Some("Bearer ")] {
            assert_eq!(
                bearer_token(header),
                Err(IdentityError::MissingToken),
                "header {header:?}"
            );
        }
    }
}
