//! Axum routes for a receiver.
//!
//! `{base}/:receiver` and `{base}/:receiver/:id` accept any method; the gate
//! runs first, then the route matcher, then the dispatcher. A verified POST is
//! handed to the configured [`WebhookHandler`].

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
};
use std::collections::HashMap;
use std::sync::Arc;

use super::dispatcher::{DispatchOutcome, ReceiverDispatcher, Reply, WebhookRequest};
use super::gate::{match_receiver, require_secure_connection, unknown_receiver_message};
use super::handler::{WebhookHandler, run_handler};

/// Shared state for the receiver routes
#[derive(Clone)]
pub struct ReceiverState {
    dispatcher: Arc<ReceiverDispatcher>,
    handler: Arc<dyn WebhookHandler>,
}

impl ReceiverState {
    pub fn new(dispatcher: ReceiverDispatcher, handler: Arc<dyn WebhookHandler>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            handler,
        }
    }

    pub fn dispatcher(&self) -> &ReceiverDispatcher {
        &self.dispatcher
    }
}

/// Route group for one receiver, nested under the configured base path
///
/// # Example
///
/// ```rust,ignore
/// let state = ReceiverState::new(dispatcher, Arc::new(MyHandler));
/// let routes = WebhookRoutes::new(state);
/// let app = Router::new().nest(routes.prefix(), routes.routes());
/// ```
pub struct WebhookRoutes {
    state: ReceiverState,
}

impl WebhookRoutes {
    pub fn new(state: ReceiverState) -> Self {
        Self { state }
    }

    /// Path prefix the routes are mounted under
    pub fn prefix(&self) -> &str {
        &self.state.dispatcher.config().base_path
    }

    /// Receiver routes with the secure-connection gate applied
    pub fn routes(&self) -> Router {
        Router::new()
            .route("/:receiver", any(receive_default))
            .route("/:receiver/:id", any(receive_with_id))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                require_secure_connection,
            ))
            .with_state(self.state.clone())
    }

    /// Mount the routes on `router` under [`prefix`](Self::prefix)
    pub fn register(self, router: Router) -> Router {
        let prefix = self.prefix().trim_end_matches('/').to_string();
        if prefix.is_empty() {
            router.merge(self.routes())
        } else {
            router.nest(&prefix, self.routes())
        }
    }
}

async fn receive_default(
    State(state): State<ReceiverState>,
    Path(receiver): Path<String>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    receive(state, receiver, String::new(), method, headers, query, body).await
}

async fn receive_with_id(
    State(state): State<ReceiverState>,
    Path((receiver, id)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    receive(state, receiver, id, method, headers, query, body).await
}

async fn receive(
    state: ReceiverState,
    receiver: String,
    receiver_id: String,
    method: Method,
    headers: HeaderMap,
    query: HashMap<String, String>,
    body: Bytes,
) -> Response {
    if !match_receiver(state.dispatcher.receiver(), &receiver) {
        tracing::debug!(receiver = %receiver, "No WebHook receiver registered under this name");
        return Reply::new(StatusCode::NOT_FOUND, unknown_receiver_message(&receiver))
            .into_response();
    }

    let request = WebhookRequest {
        method,
        receiver_id,
        headers,
        query,
        body,
    };

    match state.dispatcher.dispatch(&request).await {
        DispatchOutcome::Reply(reply) => reply.into_response(),
        DispatchOutcome::Handle(context) => {
            match run_handler(state.handler.as_ref(), &context).await {
                Ok(()) => StatusCode::OK.into_response(),
                Err(e) => e.into_response(),
            }
        }
    }
}
