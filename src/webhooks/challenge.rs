//! GET echo handshake.
//!
//! When a sender registers the receiver URL it issues a GET carrying an echo
//! token. Answering with the token verbatim proves the URL is live and that a
//! secret exists for the receiver id. The handshake never reaches handlers.

use std::sync::Arc;

use super::dispatcher::Reply;
use super::secrets::SecretResolver;

pub const INVALID_REQUEST: &str = "Invalid Request";
pub const NO_ECHO_PROVIDED: &str = "No Echo Provided";

/// Answers the echo handshake for one receiver
pub struct ChallengeResponder {
    receiver: String,
    resolver: Arc<dyn SecretResolver>,
}

impl ChallengeResponder {
    pub fn new(receiver: impl Into<String>, resolver: Arc<dyn SecretResolver>) -> Self {
        Self {
            receiver: receiver.into(),
            resolver,
        }
    }

    /// Resolve the secret for `receiver_id` and build the handshake reply
    pub async fn respond(&self, receiver_id: &str, echo: Option<&str>) -> Reply {
        let secret_present = self
            .resolver
            .resolve(&self.receiver, receiver_id)
            .await
            .is_some();

        challenge_reply(&self.receiver, receiver_id, secret_present, echo)
    }
}

/// Build the handshake reply.
///
/// Stops at the first failure: a missing secret wins over a missing echo.
pub fn challenge_reply(
    receiver: &str,
    receiver_id: &str,
    secret_present: bool,
    echo: Option<&str>,
) -> Reply {
    if !secret_present {
        tracing::error!(
            receiver,
            receiver_id,
            "WebHook verification failed: no secret configured"
        );
        return Reply::bad_request(INVALID_REQUEST);
    }

    match echo {
        Some(echo) if !echo.is_empty() => {
            tracing::info!(receiver, receiver_id, "WebHook verification succeeded");
            Reply::ok(echo)
        }
        _ => {
            tracing::error!(
                receiver,
                receiver_id,
                "WebHook verification failed: no echo provided"
            );
            Reply::bad_request(NO_ECHO_PROVIDED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webhooks::secrets::SecretStore;
    use axum::http::StatusCode;

    fn responder() -> ChallengeResponder {
        let store =
            SecretStore::parse("custom", "0123456789abcdef0123456789abcdef", 32, 128).unwrap();
        ChallengeResponder::new("custom", Arc::new(store))
    }

    #[test]
    fn test_echo_returned_verbatim() {
        let reply = challenge_reply("custom", "", true, Some("ping123"));
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, "ping123");
    }

    #[test]
    fn test_echo_not_transformed() {
        let reply = challenge_reply("custom", "", true, Some("  Mixed Case & spaces "));
        assert_eq!(reply.body, "  Mixed Case & spaces ");
    }

    #[test]
    fn test_missing_echo() {
        let reply = challenge_reply("custom", "", true, None);
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body, NO_ECHO_PROVIDED);
    }

    #[test]
    fn test_empty_echo() {
        let reply = challenge_reply("custom", "", true, Some(""));
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body, NO_ECHO_PROVIDED);
    }

    #[test]
    fn test_missing_secret_short_circuits() {
        let with_echo = challenge_reply("custom", "nobody", false, Some("ping"));
        assert_eq!(with_echo.status, StatusCode::BAD_REQUEST);
        assert_eq!(with_echo.body, INVALID_REQUEST);

        let without_echo = challenge_reply("custom", "nobody", false, None);
        assert_eq!(without_echo.body, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_responder_resolves_secret() {
        let responder = responder();

        let ok = responder.respond("", Some("ping123")).await;
        assert_eq!(ok.status, StatusCode::OK);
        assert_eq!(ok.body, "ping123");

        let unknown = responder.respond("other", Some("ping123")).await;
        assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
        assert_eq!(unknown.body, INVALID_REQUEST);
    }
}
