//! Builders for signed test tokens.
//!
//! Produces RS256 tokens against the fixture keys, plus deliberately
//! broken tokens (tampered signature, wrong algorithm) for negative
//! tests.

use crate::rsa_fixtures::TestRsaKey;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for signed test tokens.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("user-1")
///     .with_audience("my-app")
///     .sign(&primary_key());
/// ```
pub struct TestTokenBuilder {
    sub: Option<String>,
    aud: Option<String>,
    exp: Option<i64>,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a builder with sensible defaults: subject `test-subject`,
    /// audience `test-audience`, expiry one hour out.
    pub fn new() -> Self {
        Self {
            sub: Some("test-subject".to_string()),
            aud: Some("test-audience".to_string()),
            exp: Some((Utc::now() + Duration::seconds(3600)).timestamp()),
            extra: Map::new(),
        }
    }

    /// Set the subject claim.
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    /// Drop the subject claim entirely.
    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    /// Set the audience claim.
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = Some(audience.to_string());
        self
    }

    /// Drop the audience claim entirely.
    pub fn without_audience(mut self) -> Self {
        self.aud = None;
        self
    }

    /// Set expiry as an offset in seconds from now (negative = expired).
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some((Utc::now() + Duration::seconds(seconds)).timestamp());
        self
    }

    /// Add an arbitrary extra claim.
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value.
    pub fn build_claims(&self) -> Value {
        let mut claims = self.extra.clone();
        if let Some(sub) = &self.sub {
            claims.insert("sub".to_string(), json!(sub));
        }
        if let Some(aud) = &self.aud {
            claims.insert("aud".to_string(), json!(aud));
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        Value::Object(claims)
    }

    /// Sign with RS256 under the given fixture key, using its `kid`.
    pub fn sign(&self, key: &TestRsaKey) -> String {
        self.sign_with_kid(key, key.kid)
    }

    /// Sign with RS256 but stamp an arbitrary `kid` into the header,
    /// for unknown-key tests.
    pub fn sign_with_kid(&self, key: &TestRsaKey, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());

        jsonwebtoken::encode(&header, &self.build_claims(), &key.encoding_key())
            .expect("signing a test token must succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Corrupt a token's signature while leaving header and payload intact.
///
/// Flips the first character of the signature segment, which always
/// carries meaningful bits, so the result stays valid base64url but
/// decodes to different signature bytes.
pub fn tamper_signature(token: &str) -> String {
    let (prefix, signature) = token
        .rsplit_once('.')
        .expect("token must have a signature segment");

    let mut chars = signature.chars();
    let first = chars.next().expect("signature must be non-empty");
    let flipped = if first == 'A' { 'B' } else { 'A' };

    format!("{prefix}.{flipped}{}", chars.as_str())
}

/// An HS256-signed token carrying the given `kid`, for algorithm
/// confusion tests. The signing secret is irrelevant; verification must
/// fail on the algorithm before any signature check.
pub fn hs256_token(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());

    let key = EncodingKey::from_secret(b"not-the-provider-key");
    jsonwebtoken::encode(&header, claims, &key).expect("signing a test token must succeed")
}
