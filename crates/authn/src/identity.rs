//! Validated identity and wire claims.
//!
//! [`Claims`] is the deserialized token payload; [`Identity`] is the
//! result handed to callers after validation. Subject identifiers are
//! redacted in Debug output to prevent exposure in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// JWT claims as carried on the wire.
///
/// Only constructed by the verifier during token decoding. Unrecognized
/// claims are ignored. The `sub` field is redacted in Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (stable unique user identifier) - redacted in Debug output.
    pub sub: String,

    /// Audience the token was issued for.
    pub aud: String,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Optional provider-specific user identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    /// Optional email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .finish_non_exhaustive()
    }
}

/// The validated result of a token.
///
/// Constructed only from validated claims; immutable; consumed by the
/// calling request handler and discarded at the end of the connection's
/// lifetime. The `subject` field is redacted in Debug output.
#[derive(Clone, Serialize)]
pub struct Identity {
    /// Stable unique user identifier from the `sub` claim.
    #[serde(rename = "sub")]
    pub subject: String,

    /// Optional provider-specific user identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    /// Optional email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("subject", &"[REDACTED]")
            .field("user_id", &self.user_id.as_deref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            subject: claims.sub,
            user_id: claims.user_id,
            name: claims.name,
            picture: claims.picture,
            email: claims.email,
        }
    }
}
