//! Test utilities for the authentication core.
//!
//! Provides deterministic RSA key fixtures, JWKS document builders, and
//! signed-token builders for exercising the verifier and gate against a
//! mocked JWKS endpoint. Test-only: keys here are public knowledge.

pub mod rsa_fixtures;
pub mod token_builders;

pub use rsa_fixtures::{jwks_document, primary_key, rotated_key, TestRsaKey};
pub use token_builders::{hs256_token, tamper_signature, TestTokenBuilder};
