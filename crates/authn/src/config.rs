//! Authentication provider configuration.
//!
//! Configuration is loaded from environment variables once at process
//! start and shared read-only by all verification calls. A fully absent
//! configuration is a valid state (auth unconfigured); the gate denies
//! every connection in that state rather than crashing or passing
//! requests through unauthenticated.

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default request header carrying the bearer token.
pub const DEFAULT_HEADER_NAME: &str = "authorization";

/// Per-deployment identity provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// URL of the provider's JSON Web Key Set endpoint.
    pub jwks_url: String,

    /// Expected `aud` claim; identifies this application to the provider.
    pub audience: String,

    /// Request header carrying the bearer token (case-insensitive lookup).
    pub header_name: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

impl ProviderConfig {
    /// Load provider configuration from environment variables.
    ///
    /// Reads `AUTH_JWKS_URL`, `AUTH_AUDIENCE`, and `AUTH_HEADER_NAME`
    /// (defaults to `authorization`). Returns `Ok(None)` when both
    /// `AUTH_JWKS_URL` and `AUTH_AUDIENCE` are unset: auth is then
    /// unconfigured and the gate denies all connections.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` when exactly one of the two
    /// required variables is set. A half-configured provider is a
    /// deployment mistake, not a disabled one.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load provider configuration from a map (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Option<Self>, ConfigError> {
        match (vars.get("AUTH_JWKS_URL"), vars.get("AUTH_AUDIENCE")) {
            (None, None) => Ok(None),
            (Some(jwks_url), Some(audience)) => {
                let header_name = vars
                    .get("AUTH_HEADER_NAME")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_HEADER_NAME.to_string());

                Ok(Some(ProviderConfig {
                    jwks_url: jwks_url.clone(),
                    audience: audience.clone(),
                    header_name,
                }))
            }
            (Some(_), None) => Err(ConfigError::MissingEnvVar("AUTH_AUDIENCE".to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar("AUTH_JWKS_URL".to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_vars_full_configuration() {
        let config = ProviderConfig::from_vars(&vars(&[
            ("AUTH_JWKS_URL", "https://issuer.example/jwks.json"),
            ("AUTH_AUDIENCE", "my-app"),
            ("AUTH_HEADER_NAME", "x-forwarded-authorization"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.jwks_url, "https://issuer.example/jwks.json");
        assert_eq!(config.audience, "my-app");
        assert_eq!(config.header_name, "x-forwarded-authorization");
    }

    #[test]
    fn test_from_vars_default_header_name() {
        let config = ProviderConfig::from_vars(&vars(&[
            ("AUTH_JWKS_URL", "https://issuer.example/jwks.json"),
            ("AUTH_AUDIENCE", "my-app"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.header_name, DEFAULT_HEADER_NAME);
    }

    #[test]
    fn test_from_vars_unconfigured_is_none() {
        let config = ProviderConfig::from_vars(&vars(&[])).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_from_vars_missing_audience_is_error() {
        let result = ProviderConfig::from_vars(&vars(&[(
            "AUTH_JWKS_URL",
            "https://issuer.example/jwks.json",
        )]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "AUTH_AUDIENCE"));
    }

    #[test]
    fn test_from_vars_missing_jwks_url_is_error() {
        let result = ProviderConfig::from_vars(&vars(&[("AUTH_AUDIENCE", "my-app")]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "AUTH_JWKS_URL"));
    }
}
