//! API server configuration.

use athletiq_core::provider::openai::OPENAI_API_BASE;
use thiserror::Error;
use url::Url;

/// Configuration errors detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiConfigError {
    #[error("Unknown AUTH_MODE: {0} (expected \"fixed\" or \"firebase\")")]
    InvalidAuthMode(String),

    #[error("Invalid OPENAI_BASE_URL: {0}")]
    InvalidBaseUrl(String),
}

/// How callers are identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Every request runs as `subject`; credentials are not checked.
    Fixed { subject: String },
    /// Bearer ID tokens are verified with the identity provider.
    Firebase,
}

/// Configuration for the API server.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    pub auth_mode: AuthMode,
    /// LLM provider credential; absence is reported per request.
    pub openai_api_key: Option<String>,
    pub openai_base_url: Url,
    /// Model used for every tenant.
    pub model: String,
    /// Plan label used for every tenant.
    pub plan: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable          | Default                     |
    /// |-------------------|-----------------------------|
    /// | `BIND_ADDR`       | `127.0.0.1:3000`            |
    /// | `AUTH_MODE`       | `fixed`                     |
    /// | `DEV_SUBJECT`     | `dev`                       |
    /// | `OPENAI_API_KEY`  | unset                       |
    /// | `OPENAI_BASE_URL` | `https://api.openai.com/v1` |
    /// | `COACH_MODEL`     | `gpt-4o-mini`               |
    /// | `COACH_PLAN`      | `starter`                   |
    ///
    /// `firebase` mode additionally reads `FB_PROJECT_ID`, `FB_CLIENT_EMAIL`
    /// and `FB_PRIVATE_KEY`, lazily on the first authenticated request.
    pub fn from_env() -> Result<Self, ApiConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ApiConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let auth_mode = match var("AUTH_MODE").as_deref().map(str::trim) {
            None | Some("fixed") => AuthMode::Fixed {
                subject: var("DEV_SUBJECT").unwrap_or_else(|| "dev".into()),
            },
            Some("firebase") => AuthMode::Firebase,
            Some(other) => return Err(ApiConfigError::InvalidAuthMode(other.to_string())),
        };

        let base_url = var("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_API_BASE.into());
        let openai_base_url = base_url
            .parse::<Url>()
            .map_err(|e| ApiConfigError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".into()),
            auth_mode,
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url,
            model: var("COACH_MODEL").unwrap_or_else(|| "gpt-4o-mini".into()),
            plan: var("COACH_PLAN").unwrap_or_else(|| "starter".into()),
        })
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("auth_mode", &self.auth_mode)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_base_url", &self.openai_base_url.as_str())
            .field("model", &self.model)
            .field("plan", &self.plan)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ApiConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]).expect("config");
        assert_eq!(cfg.bind_addr, "127.0.0.1:3000");
        assert_eq!(
            cfg.auth_mode,
            AuthMode::Fixed {
                subject: "dev".into()
            }
        );
        assert_eq!(cfg.openai_api_key, None);
        assert_eq!(cfg.openai_base_url.as_str(), "https://api.openai.com/v1");
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.plan, "starter");
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("AUTH_MODE", "firebase"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
            ("COACH_MODEL", "gpt-4o"),
            ("COACH_PLAN", "pro"),
        ])
        .expect("config");
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.auth_mode, AuthMode::Firebase);
        assert_eq!(cfg.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.openai_base_url.as_str(), "http://localhost:11434/v1");
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.plan, "pro");
    }

    #[test]
    fn fixed_mode_uses_dev_subject() {
        let cfg = config(&[("AUTH_MODE", "fixed"), ("DEV_SUBJECT", "athlete-42")]).expect("config");
        assert_eq!(
            cfg.auth_mode,
            AuthMode::Fixed {
                subject: "athlete-42".into()
            }
        );
    }

    #[test]
    fn blank_api_key_counts_as_unset() {
        let cfg = config(&[("OPENAI_API_KEY", "  ")]).expect("config");
        assert_eq!(cfg.openai_api_key, None);
    }

    #[test]
    fn rejects_unknown_auth_mode() {
        assert_eq!(
            config(&[("AUTH_MODE", "ldap")]),
            Err(ApiConfigError::InvalidAuthMode("ldap".into()))
        );
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            config(&[("OPENAI_BASE_URL", "not a url")]),
            Err(ApiConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn debug_redacts_api_key() {
        let cfg = config(&[("OPENAI_API_KEY", "sk-secret")]).expect("config");
        assert!(!format!("{cfg:?}").contains("sk-secret"));
    }
}
