//! Authorization gate: the single entry point for authenticating an
//! inbound connection.
//!
//! The gate is a fail-closed boundary. Extraction and verification
//! failures are logged with full detail server-side and collapsed into a
//! uniform [`NotAuthenticated`] rejection; no internal error crosses the
//! boundary. An unconfigured gate denies every connection.

use crate::config::ProviderConfig;
use crate::errors::{NotAuthenticated, Transport};
use crate::extract;
use crate::identity::Identity;
use crate::jwks::KeySource;
use crate::verify::TokenVerifier;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::instrument;

/// An inbound connection awaiting authentication.
///
/// The two variants select the token-extraction protocol; they are
/// matched exhaustively rather than inspected at runtime.
#[derive(Debug, Clone, Copy)]
pub enum Inbound<'a> {
    /// Ordinary request/response call carrying `Bearer <token>` in a
    /// header.
    Http(&'a HeaderMap),

    /// WebSocket handshake carrying `Authorization.Bearer.<token>` in
    /// the subprotocol list.
    WebSocketHandshake(&'a HeaderMap),
}

impl Inbound<'_> {
    fn transport(&self) -> Transport {
        match self {
            Inbound::Http(_) => Transport::Http,
            Inbound::WebSocketHandshake(_) => Transport::WebSocketHandshake,
        }
    }
}

/// The process-wide authorization gate.
pub struct AuthGate {
    config: Option<ProviderConfig>,
    verifier: TokenVerifier,
}

impl AuthGate {
    /// Create a gate over the process-wide provider configuration.
    ///
    /// `None` means auth was never configured. The gate then denies
    /// every connection: unconfigured auth is closed, not open, and is
    /// logged as a deployment problem rather than an authentication
    /// failure.
    pub fn new(config: Option<ProviderConfig>, key_source: Arc<KeySource>) -> Self {
        Self {
            config,
            verifier: TokenVerifier::new(key_source),
        }
    }

    /// Authenticate an inbound connection.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthenticated`] on any failure. The underlying cause
    /// (no token, key-source failure, verification failure, missing
    /// configuration) is logged and never surfaced to the caller.
    #[instrument(skip_all, name = "authn.gate")]
    pub async fn authorize(&self, inbound: Inbound<'_>) -> Result<Identity, NotAuthenticated> {
        let rejected = NotAuthenticated::new(inbound.transport());

        // Deployment misconfiguration, not a request failure: logged on
        // a separate target so it stays distinguishable in logs/metrics.
        let Some(config) = &self.config else {
            tracing::error!(
                target: "authn.gate.config",
                "No auth provider configured; denying connection"
            );
            return Err(rejected);
        };

        let token = match inbound {
            Inbound::Http(headers) => extract::bearer_from_header(headers, &config.header_name),
            Inbound::WebSocketHandshake(headers) => extract::bearer_from_subprotocols(headers),
        };

        let Some(token) = token else {
            tracing::debug!(target: "authn.gate", "No bearer token found on connection");
            return Err(rejected);
        };

        match self.verifier.verify(&token, config).await {
            Ok(identity) => {
                tracing::debug!(target: "authn.gate", "Connection authenticated");
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(target: "authn.gate", error = %e, "Token verification failed");
                Err(rejected)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_unconfigured_gate_denies_http() {
        let gate = AuthGate::new(None, Arc::new(KeySource::new()));
        let headers = HeaderMap::new();

        let result = gate.authorize(Inbound::Http(&headers)).await;
        let rejection = result.expect_err("unconfigured gate must deny");
        assert_eq!(rejection.transport(), Transport::Http);
    }

    #[tokio::test]
    async fn test_unconfigured_gate_denies_handshake() {
        let gate = AuthGate::new(None, Arc::new(KeySource::new()));
        let headers = HeaderMap::new();

        let result = gate.authorize(Inbound::WebSocketHandshake(&headers)).await;
        let rejection = result.expect_err("unconfigured gate must deny");
        assert_eq!(rejection.transport(), Transport::WebSocketHandshake);
    }

    #[tokio::test]
    async fn test_missing_token_denied_without_network_io() {
        // jwks_url points nowhere; extraction fails first, so no fetch
        // is attempted and the rejection is immediate.
        let config = ProviderConfig {
            jwks_url: "http://127.0.0.1:1/jwks.json".to_string(),
            audience: "my-app".to_string(),
            header_name: "authorization".to_string(),
        };
        let gate = AuthGate::new(Some(config), Arc::new(KeySource::new()));

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));

        let result = gate.authorize(Inbound::Http(&headers)).await;
        assert!(result.is_err());
    }
}
