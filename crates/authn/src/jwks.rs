//! Key source: fetches and caches provider signing keys from JWKS
//! endpoints.
//!
//! One cache entry per distinct JWKS URL for the lifetime of the process.
//! There is no time-based expiry: a refetch happens when a token names a
//! `kid` that is not in the cached set, which covers provider key
//! rotation without a TTL.
//!
//! # Concurrency
//!
//! The cache is a `RwLock`-guarded map from URL to an `Arc` of the whole
//! key set. Refreshes build the new set off-lock and swap it in whole, so
//! readers only ever observe the previous or the new complete set.
//! Concurrent misses for the same URL may both fetch; the last write
//! wins.

use crate::errors::KeySourceError;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::instrument;

/// HTTP timeout for JWKS fetches.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON Web Key from a JWKS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for the keys this core accepts).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    pub kid: String,

    /// Declared algorithm (must be "RS256" to be usable).
    #[serde(default)]
    pub alg: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS document as served by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

type KeyMap = HashMap<String, Jwk>;

/// Fetches and caches signing keys, keyed by JWKS URL.
pub struct KeySource {
    /// HTTP client for fetching JWKS documents.
    http_client: reqwest::Client,

    /// Cached key sets, one entry per JWKS URL.
    cache: RwLock<HashMap<String, Arc<KeyMap>>>,
}

impl KeySource {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "authn.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http_client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the signing key named by `kid` from the key set at
    /// `jwks_url`.
    ///
    /// The first call for a URL fetches the key set over the network and
    /// populates the cache; later calls take the read-lock path only. If
    /// `kid` is absent from the cached set, the set is refetched once
    /// before failing, which handles provider key rotation.
    ///
    /// # Errors
    ///
    /// Returns `KeySourceError` when the endpoint is unreachable, the
    /// body is not a valid key set, or the `kid` is absent even after a
    /// refetch.
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn resolve_key(&self, jwks_url: &str, kid: &str) -> Result<Jwk, KeySourceError> {
        {
            let cache = self.cache.read().await;
            if let Some(keys) = cache.get(jwks_url) {
                if let Some(key) = keys.get(kid) {
                    tracing::debug!(target: "authn.jwks", kid = %kid, "JWKS cache hit");
                    return Ok(key.clone());
                }
                tracing::debug!(target: "authn.jwks", kid = %kid, "Key not in cached set, refetching");
            }
        }

        let keys = self.refresh(jwks_url).await?;

        keys.get(kid).cloned().ok_or_else(|| {
            tracing::warn!(target: "authn.jwks", kid = %kid, "Key not found in JWKS after refetch");
            KeySourceError::UnknownKeyId(kid.to_string())
        })
    }

    /// Fetch the key set at `jwks_url` and replace its cache entry.
    async fn refresh(&self, jwks_url: &str) -> Result<Arc<KeyMap>, KeySourceError> {
        tracing::debug!(target: "authn.jwks", url = %jwks_url, "Fetching JWKS");

        let response = self
            .http_client
            .get(jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "authn.jwks", error = %e, "Failed to fetch JWKS");
                KeySourceError::Fetch(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "authn.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(KeySourceError::Fetch(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        let jwks: JwksResponse = response.json().await.map_err(|e| {
            tracing::error!(target: "authn.jwks", error = %e, "Failed to parse JWKS response");
            KeySourceError::Malformed(e.to_string())
        })?;

        let keys: Arc<KeyMap> = Arc::new(
            jwks.keys
                .into_iter()
                .map(|key| (key.kid.clone(), key))
                .collect(),
        );

        tracing::info!(
            target: "authn.jwks",
            url = %jwks_url,
            key_count = keys.len(),
            "JWKS cache refreshed"
        );

        let mut cache = self.cache.write().await;
        cache.insert(jwks_url.to_string(), Arc::clone(&keys));

        Ok(keys)
    }

    /// Clear all cached key sets.
    ///
    /// Useful for testing.
    #[cfg(test)]
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }
}

impl Default for KeySource {
    fn default() -> Self {
        Self::new()
    }
}
