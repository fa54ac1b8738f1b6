// @zen-component: COACH-FirebaseVerifier
//
//! Firebase ID token verification.
//!
//! ID tokens are RS256 JWTs signed with Google's rotating `securetoken`
//! keys. The verifier lazily builds one [`IdentityClient`] on first use and
//! shares it for the rest of the process; the published key set is fetched
//! on first verification and refetched once whenever a token names a key id
//! that is not cached. Refetches are serialized and at most one happens per
//! [`MIN_KEY_REFRESH_INTERVAL`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info};

use super::{IdentityError, IdentityResolver, VerifiedIdentity, bearer_token};

/// Public keys for Firebase ID tokens.
pub const SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Shortest gap between two key-set fetches.
pub const MIN_KEY_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Service-account credentials for the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    pub project_id: String,
    pub client_email: String,
    /// PEM private key with real newlines.
    pub private_key: String,
}

impl ServiceAccount {
    /// Read `FB_PROJECT_ID`, `FB_CLIENT_EMAIL` and `FB_PRIVATE_KEY`.
    pub fn from_env() -> Result<Self, IdentityError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from any variable source.
    ///
    /// The private key is usually stored on one line with literal `\n`
    /// sequences; those are turned back into newlines.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IdentityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| IdentityError::Unavailable(format!("{name} is not set")))
        };
        Ok(Self {
            project_id: required("FB_PROJECT_ID")?,
            client_email: required("FB_CLIENT_EMAIL")?,
            private_key: unescape_private_key(&required("FB_PRIVATE_KEY")?),
        })
    }

    fn issuer(&self) -> String {
        format!("{ISSUER_PREFIX}{}", self.project_id)
    }
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Turn literal `\n` escapes back into newlines.
pub fn unescape_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

/// Claims read from a verified ID token.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
}

/// Shared identity-provider client: credentials, HTTP client and key cache.
#[derive(Debug)]
pub struct IdentityClient {
    account: ServiceAccount,
    http: reqwest::Client,
    jwks_url: String,
    keys: RwLock<JwkSet>,
    /// When the key set was last loaded; the lock also serializes fetches.
    last_refresh: Mutex<Option<Instant>>,
    min_refresh_interval: Duration,
}

impl IdentityClient {
    pub fn new(account: ServiceAccount, jwks_url: &str) -> Self {
        info!(
            project_id = %account.project_id,
            client_email = %account.client_email,
            "initialized identity provider client"
        );
        Self {
            account,
            http: reqwest::Client::new(),
            jwks_url: jwks_url.to_string(),
            keys: RwLock::new(JwkSet { keys: Vec::new() }),
            last_refresh: Mutex::new(None),
            min_refresh_interval: MIN_KEY_REFRESH_INTERVAL,
        }
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Verify an ID token, returning the decoded identity.
    pub async fn verify_id_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let header = decode_header(token).map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("token has no key id".into()))?;
        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.account.project_id]);
        validation.set_issuer(&[self.account.issuer()]);

        let claims = decode::<IdTokenClaims>(token, &key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?
            .claims;
        if claims.sub.is_empty() {
            return Err(IdentityError::InvalidToken("empty subject".into()));
        }

        Ok(VerifiedIdentity {
            subject: claims.sub,
            email: claims.email,
        })
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, IdentityError> {
        if let Some(key) = self.cached_key(kid).await? {
            return Ok(key);
        }

        let mut last_refresh = self.last_refresh.lock().await;
        // A concurrent request may have loaded the key while we waited.
        if let Some(key) = self.cached_key(kid).await? {
            return Ok(key);
        }
        let unknown = || IdentityError::InvalidToken(format!("unknown key id {kid}"));
        if last_refresh.is_some_and(|at| at.elapsed() < self.min_refresh_interval) {
            debug!(kid, "key set refreshed recently, not refetching");
            return Err(unknown());
        }
        self.refresh_keys().await?;
        *last_refresh = Some(Instant::now());
        drop(last_refresh);

        self.cached_key(kid).await?.ok_or_else(unknown)
    }

    async fn cached_key(&self, kid: &str) -> Result<Option<DecodingKey>, IdentityError> {
        let keys = self.keys.read().await;
        keys.find(kid)
            .map(DecodingKey::from_jwk)
            .transpose()
            .map_err(|e| IdentityError::InvalidToken(format!("unusable key {kid}: {e}")))
    }

    async fn refresh_keys(&self) -> Result<(), IdentityError> {
        let set: JwkSet = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| IdentityError::Unavailable(format!("key fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("key set parse failed: {e}")))?;
        debug!(count = set.keys.len(), "refreshed identity provider keys");
        *self.keys.write().await = set;
        Ok(())
    }
}

/// [`IdentityResolver`] backed by the identity provider.
#[derive(Debug)]
pub struct FirebaseVerifier {
    account: Option<ServiceAccount>,
    jwks_url: String,
    min_refresh_interval: Duration,
    client: OnceCell<IdentityClient>,
}

impl FirebaseVerifier {
    /// Credentials are read from the environment on first use.
    pub fn from_env() -> Self {
        Self {
            account: None,
            jwks_url: SECURETOKEN_JWKS_URL.to_string(),
            min_refresh_interval: MIN_KEY_REFRESH_INTERVAL,
            client: OnceCell::new(),
        }
    }

    pub fn with_account(account: ServiceAccount) -> Self {
        Self {
            account: Some(account),
            ..Self::from_env()
        }
    }

    /// Override where public keys are fetched from.
    pub fn with_jwks_url(mut self, url: &str) -> Self {
        self.jwks_url = url.to_string();
        self
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Whether the shared client has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> Result<&IdentityClient, IdentityError> {
        self.client
            .get_or_try_init(|| async {
                let account = match &self.account {
                    Some(account) => account.clone(),
                    None => ServiceAccount::from_env()?,
                };
                Ok::<_, IdentityError>(
                    IdentityClient::new(account, &self.jwks_url)
                        .with_min_refresh_interval(self.min_refresh_interval),
                )
            })
            .await
    }
}

#[async_trait]
impl IdentityResolver for FirebaseVerifier {
    async fn resolve(&self, authorization: Option<&str>) -> Result<VerifiedIdentity, IdentityError> {
        let token = bearer_token(authorization)?;
        self.client().await?.verify_id_token(token).await
    }
}
