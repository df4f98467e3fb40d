//! Per-request entry point for a receiver.
//!
//! The dispatcher branches on the HTTP method and returns a [`DispatchOutcome`]:
//! either a [`HandlerContext`] for a verified POST, or a [`Reply`] that must be
//! sent as-is. Rejections are ordinary values here, never errors.

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::actions::extract_actions;
use super::challenge::ChallengeResponder;
use super::handler::HandlerContext;
use super::secrets::SecretResolver;
use super::verification::{HmacSha256Verifier, WebhookVerifier};
use crate::config::ReceiverConfig;

pub const INVALID_WEBHOOK_REQUEST: &str = "Invalid WebHook Request";
pub const INVALID_JSON: &str = "The WebHook request contained invalid JSON.";
pub const NOT_JSON: &str = "The WebHook request must contain an entity body formatted as JSON.";

/// A plain-text response decided by the receiver itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, self.body).into_response()
    }
}

/// What the receiver decided for one request
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Verified delivery; downstream handlers should run
    Handle(HandlerContext),
    /// Respond directly; no handler runs
    Reply(Reply),
}

impl DispatchOutcome {
    pub fn context(&self) -> Option<&HandlerContext> {
        match self {
            Self::Handle(context) => Some(context),
            Self::Reply(_) => None,
        }
    }

    pub fn into_context(self) -> Option<HandlerContext> {
        match self {
            Self::Handle(context) => Some(context),
            Self::Reply(_) => None,
        }
    }

    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Self::Handle(_) => None,
            Self::Reply(reply) => Some(reply),
        }
    }
}

/// The parts of an inbound request the dispatcher looks at
///
/// `body` holds the bytes exactly as received; both the signature check and
/// JSON parsing read this one buffer.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub method: Method,
    pub receiver_id: String,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    pub body: Bytes,
}

impl WebhookRequest {
    pub fn new(method: Method, receiver_id: impl Into<String>) -> Self {
        Self {
            method,
            receiver_id: receiver_id.into(),
            headers: HeaderMap::new(),
            query: HashMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: header::HeaderName, value: header::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Orchestrates the handshake, verification and action extraction for one
/// configured receiver
pub struct ReceiverDispatcher {
    config: ReceiverConfig,
    verifier: Arc<dyn WebhookVerifier>,
    challenge: ChallengeResponder,
}

impl ReceiverDispatcher {
    /// Build a dispatcher that verifies with HMAC-SHA256 using `resolver`
    pub fn new(config: ReceiverConfig, resolver: Arc<dyn SecretResolver>) -> Self {
        let verifier = HmacSha256Verifier::new(config.name.clone(), resolver.clone())
            .with_algorithm(config.algorithm.clone());
        let challenge = ChallengeResponder::new(config.name.clone(), resolver);

        Self {
            config,
            verifier: Arc::new(verifier),
            challenge,
        }
    }

    /// Replace the signature verifier
    pub fn with_verifier(mut self, verifier: Arc<dyn WebhookVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    pub fn receiver(&self) -> &str {
        &self.config.name
    }

    pub async fn dispatch(&self, request: &WebhookRequest) -> DispatchOutcome {
        match request.method {
            Method::POST => self.receive(request).await,
            Method::GET => {
                let echo = request.query.get(&self.config.echo_param).map(String::as_str);
                DispatchOutcome::Reply(self.challenge.respond(&request.receiver_id, echo).await)
            }
            _ => {
                tracing::info!(
                    receiver = %self.config.name,
                    receiver_id = %request.receiver_id,
                    method = %request.method,
                    "Unsupported WebHook request method"
                );
                DispatchOutcome::Reply(Reply::bad_request(INVALID_WEBHOOK_REQUEST))
            }
        }
    }

    async fn receive(&self, request: &WebhookRequest) -> DispatchOutcome {
        let signature = request
            .headers
            .get(self.config.signature_header.as_str())
            .and_then(|value| value.to_str().ok());

        if let Err(err) = self
            .verifier
            .verify_signature(&request.receiver_id, &request.body, signature)
            .await
        {
            return DispatchOutcome::Reply(Reply::bad_request(err.reason()));
        }

        let payload = match self.parse_payload(request) {
            Ok(payload) => payload,
            Err(reply) => return DispatchOutcome::Reply(reply),
        };

        let actions = match extract_actions(&payload) {
            Ok(actions) => actions,
            Err(err) => {
                tracing::debug!(error = %err, "Unable to extract WebHook actions");
                return DispatchOutcome::Reply(Reply::bad_request(INVALID_JSON));
            }
        };

        tracing::info!(
            receiver = %self.config.name,
            receiver_id = %request.receiver_id,
            action_count = actions.len(),
            "WebHook request verified"
        );

        DispatchOutcome::Handle(HandlerContext::new(
            self.config.name.clone(),
            request.receiver_id.clone(),
            actions,
            payload,
        ))
    }

    fn parse_payload(&self, request: &WebhookRequest) -> Result<Value, Reply> {
        if let Some(content_type) = request.headers.get(header::CONTENT_TYPE) {
            let is_json = content_type.to_str().map(is_json_content_type).unwrap_or(false);
            if !is_json {
                return Err(Reply::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, NOT_JSON));
            }
        }

        match serde_json::from_slice::<Value>(&request.body) {
            Ok(Value::Null) => Err(Reply::bad_request(INVALID_JSON)),
            Ok(payload) => Ok(payload),
            Err(err) => {
                tracing::debug!(
                    receiver = %self.config.name,
                    receiver_id = %request.receiver_id,
                    error = %err,
                    "WebHook request contained invalid JSON"
                );
                Err(Reply::bad_request(INVALID_JSON))
            }
        }
    }
}

/// `application/json`, `text/json` or any `+json` media type
pub fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || mime == "text/json" || mime.ends_with("+json")
}
