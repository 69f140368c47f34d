//! Token verification: signing algorithm allow-list, signature, audience,
//! and required claims.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only RS256 is accepted: no symmetric algorithms, no "none", which
//!   prevents downgrade/confusion attacks
//! - The `aud` claim must exactly equal the configured audience
//! - Failure detail is logged server-side, never returned to callers

use crate::config::ProviderConfig;
use crate::errors::VerificationError;
use crate::identity::{Claims, Identity};
use crate::jwks::{Jwk, KeySource};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::instrument;

/// Maximum allowed token size in bytes (8KB).
///
/// Oversized tokens are rejected before any base64 or JSON work.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// The only accepted signing algorithm.
pub const ALLOWED_ALGORITHM: &str = "RS256";

/// Validates raw tokens against a provider configuration, resolving
/// signing keys through a shared [`KeySource`].
pub struct TokenVerifier {
    key_source: Arc<KeySource>,
}

impl TokenVerifier {
    pub fn new(key_source: Arc<KeySource>) -> Self {
        Self { key_source }
    }

    /// Verify a raw token and map its claims onto an [`Identity`].
    ///
    /// Candidate `(audience, jwks_url)` pairs are tried in order and the
    /// first that both resolves a key and validates wins. Exactly one
    /// pair is configured today; the loop keeps the contract stable if
    /// multi-provider support is added.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError` when the token header cannot be
    /// parsed, no key resolves for its `kid`, the signing algorithm is
    /// not RS256, the signature or audience check fails, or a required
    /// claim is missing.
    #[instrument(skip_all)]
    pub async fn verify(
        &self,
        token: &str,
        config: &ProviderConfig,
    ) -> Result<Identity, VerificationError> {
        let kid = extract_kid(token)?;

        let candidates = [(config.audience.as_str(), config.jwks_url.as_str())];
        let mut last_err = VerificationError::NoCandidate;

        for (audience, jwks_url) in candidates {
            let jwk = match self.key_source.resolve_key(jwks_url, &kid).await {
                Ok(jwk) => jwk,
                Err(e) => {
                    tracing::debug!(target: "authn.verify", error = %e, "Failed to resolve signing key");
                    last_err = VerificationError::Key(e);
                    continue;
                }
            };

            match verify_token(token, &jwk, audience) {
                Ok(claims) => {
                    tracing::debug!(target: "authn.verify", "Token validated");
                    return Ok(Identity::from(claims));
                }
                Err(e) => {
                    tracing::debug!(target: "authn.verify", error = %e, "Token validation failed");
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }
}

/// Extract the `kid` from a token header without verifying the signature.
///
/// The token is size-checked before any decoding. The `kid` value is only
/// used for key lookup in a trusted JWKS; the token MUST still be
/// verified against the resolved key. Empty or non-string `kid` values
/// are rejected.
///
/// # Errors
///
/// Returns `TokenTooLarge`, `MalformedToken`, or `MissingKid`.
pub fn extract_kid(token: &str) -> Result<String, VerificationError> {
    if token.len() > MAX_TOKEN_SIZE_BYTES {
        tracing::debug!(
            target: "authn.verify",
            token_size = token.len(),
            max_size = MAX_TOKEN_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(VerificationError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let mut parts = token.split('.');
    let header_part = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(_), Some(_), None) => header,
        _ => {
            tracing::debug!(target: "authn.verify", "Token rejected: invalid JWT format");
            return Err(VerificationError::MalformedToken);
        }
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "authn.verify", error = %e, "Failed to decode JWT header base64");
        VerificationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "authn.verify", error = %e, "Failed to parse JWT header JSON");
        VerificationError::MalformedToken
    })?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(VerificationError::MissingKid)
}

/// Verify signature and claims against a single candidate key/audience.
fn verify_token(token: &str, jwk: &Jwk, audience: &str) -> Result<Claims, VerificationError> {
    // The key's declared algorithm must be exactly RS256; a missing
    // declaration is treated as disallowed.
    match jwk.alg.as_deref() {
        Some(ALLOWED_ALGORITHM) => {}
        Some(other) => {
            tracing::warn!(target: "authn.verify", alg = %other, "Signing key declares a disallowed algorithm");
            return Err(VerificationError::AlgorithmNotAllowed(other.to_string()));
        }
        None => {
            tracing::warn!(target: "authn.verify", kid = %jwk.kid, "Signing key declares no algorithm");
            return Err(VerificationError::AlgorithmNotAllowed("none declared".to_string()));
        }
    }

    if jwk.kty != "RSA" {
        tracing::warn!(target: "authn.verify", kty = %jwk.kty, "Unexpected JWK key type");
        return Err(VerificationError::AlgorithmNotAllowed(jwk.kty.clone()));
    }

    let (modulus, exponent) = match (&jwk.n, &jwk.e) {
        (Some(n), Some(e)) => (n, e),
        _ => {
            tracing::error!(target: "authn.verify", kid = %jwk.kid, "JWK missing RSA components");
            return Err(VerificationError::InvalidKey);
        }
    };

    let decoding_key = DecodingKey::from_rsa_components(modulus, exponent).map_err(|e| {
        tracing::error!(target: "authn.verify", error = %e, "Invalid RSA public key encoding");
        VerificationError::InvalidKey
    })?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "aud", "sub"]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|err| {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                VerificationError::InvalidSignature
            }
            jsonwebtoken::errors::ErrorKind::InvalidAudience => {
                VerificationError::AudienceMismatch
            }
            jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
                VerificationError::MissingClaim(claim.clone())
            }
            jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                VerificationError::AlgorithmNotAllowed(err.to_string())
            }
            _ => VerificationError::InvalidToken(err.to_string()),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn token_with_header(header: &str) -> String {
        let header_b64 = URL_SAFE_NO_PAD.encode(header.as_bytes());
        format!("{header_b64}.payload.signature")
    }

    #[test]
    fn test_extract_kid_valid_token() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":"test-rsa-01"}"#);
        assert_eq!(extract_kid(&token).unwrap(), "test-rsa-01");
    }

    #[test]
    fn test_extract_kid_missing_kid() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT"}"#);
        assert!(matches!(
            extract_kid(&token),
            Err(VerificationError::MissingKid)
        ));
    }

    #[test]
    fn test_extract_kid_malformed_token() {
        for token in ["not.a.valid.jwt.format", "only.two", "single", ""] {
            assert!(matches!(
                extract_kid(token),
                Err(VerificationError::MalformedToken)
            ));
        }
    }

    #[test]
    fn test_extract_kid_invalid_base64() {
        assert!(matches!(
            extract_kid("!!!invalid!!!.payload.signature"),
            Err(VerificationError::MalformedToken)
        ));
    }

    #[test]
    fn test_extract_kid_invalid_json() {
        let header_b64 = URL_SAFE_NO_PAD.encode("not valid json".as_bytes());
        let token = format!("{header_b64}.payload.signature");
        assert!(matches!(
            extract_kid(&token),
            Err(VerificationError::MalformedToken)
        ));
    }

    #[test]
    fn test_extract_kid_oversized_token() {
        let oversized = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        assert!(matches!(
            extract_kid(&oversized),
            Err(VerificationError::TokenTooLarge)
        ));
    }

    #[test]
    fn test_extract_kid_non_string_kid() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":12345}"#);
        assert!(matches!(
            extract_kid(&token),
            Err(VerificationError::MissingKid)
        ));
    }

    #[test]
    fn test_extract_kid_empty_string_kid() {
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":""}"#);
        assert!(matches!(
            extract_kid(&token),
            Err(VerificationError::MissingKid)
        ));
    }

    fn rsa_jwk(alg: Option<&str>) -> Jwk {
        Jwk {
            kty: "RSA".to_string(),
            kid: "test-rsa-01".to_string(),
            alg: alg.map(str::to_string),
            n: Some("xW85Gpjn9Ppq0m0CBxzY".to_string()),
            e: Some("AQAB".to_string()),
            key_use: Some("sig".to_string()),
        }
    }

    fn fake_token() -> String {
        let header = r#"{"alg":"RS256","typ":"JWT","kid":"test-rsa-01"}"#;
        let payload = r#"{"sub":"user-1","aud":"my-app","exp":9999999999}"#;
        format!(
            "{}.{}.fake_signature",
            URL_SAFE_NO_PAD.encode(header.as_bytes()),
            URL_SAFE_NO_PAD.encode(payload.as_bytes())
        )
    }

    #[test]
    fn test_verify_token_rejects_disallowed_key_algorithm() {
        let result = verify_token(&fake_token(), &rsa_jwk(Some("ES256")), "my-app");
        assert!(matches!(
            result,
            Err(VerificationError::AlgorithmNotAllowed(alg)) if alg == "ES256"
        ));
    }

    #[test]
    fn test_verify_token_rejects_key_without_declared_algorithm() {
        let result = verify_token(&fake_token(), &rsa_jwk(None), "my-app");
        assert!(matches!(
            result,
            Err(VerificationError::AlgorithmNotAllowed(_))
        ));
    }

    #[test]
    fn test_verify_token_rejects_non_rsa_key_type() {
        let jwk = Jwk {
            kty: "OKP".to_string(),
            ..rsa_jwk(Some("RS256"))
        };
        let result = verify_token(&fake_token(), &jwk, "my-app");
        assert!(matches!(
            result,
            Err(VerificationError::AlgorithmNotAllowed(kty)) if kty == "OKP"
        ));
    }

    #[test]
    fn test_verify_token_rejects_key_missing_rsa_components() {
        let jwk = Jwk {
            n: None,
            ..rsa_jwk(Some("RS256"))
        };
        let result = verify_token(&fake_token(), &jwk, "my-app");
        assert!(matches!(result, Err(VerificationError::InvalidKey)));
    }
}
