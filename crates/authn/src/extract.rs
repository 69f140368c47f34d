//! Transport-specific bearer token extraction.
//!
//! Extraction never interprets or validates the token. Absence of a
//! token is not an error here; the gate translates it into a uniform
//! rejection.

use axum::http::HeaderMap;

/// Literal prefix for header-carried bearer tokens.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Handshake-negotiation header scanned for subprotocol-carried tokens.
pub const WEBSOCKET_PROTOCOL_HEADER: &str = "sec-websocket-protocol";

/// Subprotocol entry prefix carrying the bearer token.
pub const WEBSOCKET_BEARER_PREFIX: &str = "Authorization.Bearer.";

/// Extract a bearer token from the named request header.
///
/// Header lookup is case-insensitive; the `Bearer ` prefix is not. The
/// remainder after the prefix is returned unmodified.
pub fn bearer_from_header(headers: &HeaderMap, header_name: &str) -> Option<String> {
    let value = headers.get(header_name)?.to_str().ok()?;

    value
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Extract a bearer token from a WebSocket handshake's subprotocol list.
///
/// The `Sec-WebSocket-Protocol` value is a comma-separated list, each
/// entry optionally whitespace-padded. The first entry starting with
/// `Authorization.Bearer.` wins; its suffix is the raw token.
pub fn bearer_from_subprotocols(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(WEBSOCKET_PROTOCOL_HEADER)?.to_str().ok()?;

    value
        .split(',')
        .map(str::trim)
        .find_map(|entry| entry.strip_prefix(WEBSOCKET_BEARER_PREFIX))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
