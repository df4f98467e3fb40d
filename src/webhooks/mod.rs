//! WebHook receiving.
//!
//! Verifies the GET echo handshake and HMAC-signed POST deliveries, extracts
//! notification actions, and hands a [`HandlerContext`] to application code.

pub mod actions;
pub mod challenge;
pub mod dispatcher;
pub mod encoding;
pub mod gate;
pub mod handler;
pub mod routes;
pub mod secrets;
pub mod verification;

pub use actions::extract_actions;
pub use challenge::{ChallengeResponder, challenge_reply};
pub use dispatcher::{DispatchOutcome, ReceiverDispatcher, Reply, WebhookRequest};
pub use encoding::{HexError, hex_decode, hex_encode};
pub use gate::{is_secure_request, match_receiver, require_secure_connection};
pub use handler::{HandlerContext, NoopHandler, WebhookHandler};
pub use routes::{ReceiverState, WebhookRoutes};
pub use secrets::{SecretResolver, SecretStore};
pub use verification::{
    HmacSha256Verifier, SignatureError, WebhookVerifier, compute_signature, constant_time_compare,
    parse_signature_header,
};
