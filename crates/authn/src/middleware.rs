//! Authentication middleware for protected routes.
//!
//! Dispatches each request through the [`AuthGate`] and injects the
//! validated [`Identity`] into request extensions for handlers.
//! WebSocket upgrade requests are routed through the handshake
//! extraction protocol; everything else uses the configured header.

use crate::errors::NotAuthenticated;
use crate::gate::{AuthGate, Inbound};
use crate::identity::Identity;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The process-wide authorization gate.
    pub gate: Arc<AuthGate>,
}

/// True when the request is a WebSocket upgrade handshake.
fn is_websocket_handshake(req: &Request) -> bool {
    req.headers()
        .get("upgrade")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Authentication middleware that validates bearer tokens.
///
/// On success the validated [`Identity`] is stored in request extensions
/// for downstream handlers. On failure the response is the gate's
/// uniform rejection: 401 for plain requests, a refused handshake for
/// WebSocket upgrades.
#[instrument(skip(state, req, next), name = "authn.middleware")]
pub async fn require_identity(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, NotAuthenticated> {
    let inbound = if is_websocket_handshake(&req) {
        Inbound::WebSocketHandshake(req.headers())
    } else {
        Inbound::Http(req.headers())
    };

    let identity = state.gate.authorize(inbound).await?;

    // Store the identity in request extensions for downstream handlers
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Extension trait for extracting the authenticated identity from a
/// request.
pub trait IdentityExt {
    /// Get the authenticated identity from request extensions.
    ///
    /// Returns `None` if auth middleware was not applied to this request.
    fn identity(&self) -> Option<&Identity>;
}

impl<B> IdentityExt for axum::extract::Request<B> {
    fn identity(&self) -> Option<&Identity> {
        self.extensions().get::<Identity>()
    }
}
