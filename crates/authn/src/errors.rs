//! Error types for the authentication core.
//!
//! Internal failures ([`KeySourceError`], [`VerificationError`]) carry
//! detail for server-side logs. The only caller-visible failure is
//! [`NotAuthenticated`], produced at the gate boundary with a
//! transport-appropriate response and no diagnostic payload.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// WebSocket close code for policy violations (RFC 6455 section 7.4.1).
///
/// Handshakes are refused before upgrade with an HTTP response; this code
/// is for callers that must close an already-accepted socket.
pub const WS_POLICY_VIOLATION: u16 = 1008;

/// Failure to fetch or use a provider's key set.
#[derive(Debug, Error)]
pub enum KeySourceError {
    /// Remote JWKS endpoint unreachable or returned a non-success status.
    #[error("JWKS fetch failed: {0}")]
    Fetch(String),

    /// JWKS body was not a valid key-set document.
    #[error("Malformed JWKS response: {0}")]
    Malformed(String),

    /// The requested key ID is absent even after a refetch.
    #[error("Unknown key ID: {0}")]
    UnknownKeyId(String),
}

/// Failure to validate a presented token.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Token exceeds maximum allowed size")]
    TokenTooLarge,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token header missing key ID")]
    MissingKid,

    #[error(transparent)]
    Key(#[from] KeySourceError),

    #[error("Signing algorithm not allowed: {0}")]
    AlgorithmNotAllowed(String),

    #[error("Signing key unusable")]
    InvalidKey,

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Audience mismatch")]
    AudienceMismatch,

    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    #[error("Token rejected: {0}")]
    InvalidToken(String),

    #[error("No candidate provider accepted the token")]
    NoCandidate,
}

/// Transport on which a rejected connection arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    WebSocketHandshake,
}

/// Uniform caller-visible rejection.
///
/// Carries only the transport kind, which selects the response shape:
/// plain requests get a generic 401 with no diagnostic detail, handshake
/// requests are refused outright with a 403 so no connection is
/// established.
#[derive(Debug, Error)]
#[error("Not authenticated")]
pub struct NotAuthenticated {
    transport: Transport,
}

impl NotAuthenticated {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for NotAuthenticated {
    fn into_response(self) -> Response {
        let status = match self.transport {
            Transport::Http => StatusCode::UNAUTHORIZED,
            Transport::WebSocketHandshake => StatusCode::FORBIDDEN,
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: "NOT_AUTHENTICATED".to_string(),
                message: "Not authenticated".to_string(),
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer error=\"invalid_token\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
