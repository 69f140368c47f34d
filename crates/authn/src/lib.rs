//! Bearer-token request authentication.
//!
//! Validates JWTs issued by an external identity provider, for both
//! ordinary HTTP requests and WebSocket handshakes, using RS256 public
//! keys fetched and cached from the provider's JWKS endpoint.
//!
//! # Architecture
//!
//! ```text
//! inbound connection -> gate -> extract -> verify -> jwks
//! ```
//!
//! Surrounding code calls a single entry point, [`AuthGate::authorize`],
//! and receives either a validated [`Identity`] or a uniform
//! [`NotAuthenticated`] rejection. Internal failure causes are logged,
//! never surfaced to callers.
//!
//! # Modules
//!
//! - `config` - Provider configuration from environment
//! - `errors` - Error types and the caller-visible rejection
//! - `extract` - Transport-specific bearer token extraction
//! - `gate` - The fail-closed authorization boundary
//! - `identity` - Validated identity and wire claims
//! - `jwks` - Key source with per-URL process-lifetime caching
//! - `middleware` - Axum middleware for protected routes
//! - `verify` - Signature, algorithm, and audience validation

pub mod config;
pub mod errors;
pub mod extract;
pub mod gate;
pub mod identity;
pub mod jwks;
pub mod middleware;
pub mod verify;

pub use config::ProviderConfig;
pub use errors::{KeySourceError, NotAuthenticated, Transport, VerificationError};
pub use gate::{AuthGate, Inbound};
pub use identity::Identity;
pub use jwks::KeySource;
pub use verify::TokenVerifier;
