//! Checks composed ahead of the dispatcher: the secure-connection gate and
//! the receiver-name route matcher.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use super::dispatcher::Reply;
use super::routes::ReceiverState;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Whether a request may reach the receiver.
///
/// Passes when HTTPS is not required or the peer is a loopback address.
/// `X-Forwarded-Proto: https` is honoured only when `trust_proxy` is set; the
/// `Host` header and request URI are client-supplied and never consulted.
pub fn is_secure_request(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    require_https: bool,
    trust_proxy: bool,
) -> bool {
    if !require_https {
        return true;
    }

    if peer.is_some_and(|addr| addr.ip().to_canonical().is_loopback()) {
        return true;
    }

    // SECURITY: without a trusted proxy in front, any client can send this header
    trust_proxy
        && headers
            .get(FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}

/// Case-insensitive receiver-name match for the `{receiver}` path segment
pub fn match_receiver(configured: &str, requested: &str) -> bool {
    configured.trim().eq_ignore_ascii_case(requested.trim())
}

pub fn https_required_message(receiver: &str) -> String {
    format!(
        "The WebHook receiver '{}' requires HTTPS in order to be secure. Please register a WebHook URI of type 'https'.",
        receiver
    )
}

pub fn unknown_receiver_message(receiver: &str) -> String {
    format!("No WebHook receiver is registered with the name '{}'.", receiver)
}

/// Middleware rejecting plain-HTTP requests when HTTPS is required
///
/// ```rust,ignore
/// let routes = Router::new()
///     .route("/:receiver", any(handler))
///     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_secure_connection));
/// ```
pub async fn require_secure_connection(
    State(state): State<ReceiverState>,
    request: Request,
    next: Next,
) -> Response {
    let config = state.dispatcher().config();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    if is_secure_request(
        request.headers(),
        peer,
        config.require_https,
        config.trust_proxy,
    ) {
        return next.run(request).await;
    }

    tracing::warn!(
        receiver = %config.name,
        path = %request.uri().path(),
        peer = ?peer,
        "Rejected WebHook request over insecure connection"
    );

    Reply::new(StatusCode::BAD_REQUEST, https_required_message(&config.name)).into_response()
}
