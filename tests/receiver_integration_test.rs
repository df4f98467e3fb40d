//! End-to-end tests for the receiver routes through the full App stack

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use hookwise::testing::{self, sign_payload};
use hookwise::webhooks::{HandlerContext, WebhookHandler};
use hookwise::{App, ConfigBuilder, ReceiverError};
use serde_json::json;
use std::sync::{Arc, Mutex};

const SECRET: &str = "0123456789abcdef0123456789abcdef";
const PARTNER_SECRET: &str = "fedcba9876543210fedcba9876543210";
const BASE: &str = "/api/webhooks/incoming/custom";
const REMOTE_PEER: &str = "203.0.113.7:40000";

#[derive(Default)]
struct RecordingHandler {
    seen: Mutex<Vec<HandlerContext>>,
}

#[async_trait]
impl WebhookHandler for RecordingHandler {
    async fn handle(&self, context: &HandlerContext) -> hookwise::Result<()> {
        self.seen.lock().unwrap().push(context.clone());
        Ok(())
    }
}

struct FailingHandler;

#[async_trait]
impl WebhookHandler for FailingHandler {
    async fn handle(&self, _context: &HandlerContext) -> hookwise::Result<()> {
        Err(ReceiverError::internal("downstream unavailable"))
    }
}

fn secrets() -> String {
    format!("{},partner={}", SECRET, PARTNER_SECRET)
}

fn app_with(handler: Arc<dyn WebhookHandler>) -> Router {
    let config = ConfigBuilder::new()
        .with_secrets(secrets())
        .with_require_https(false)
        .build()
        .unwrap();

    App::builder()
        .with_config(config)
        .with_handler(handler)
        .build()
        .unwrap()
        .into_router()
}

fn app() -> Router {
    app_with(Arc::new(RecordingHandler::default()))
}

fn https_app() -> Router {
    gated_app(false)
}

fn gated_app(trust_proxy: bool) -> Router {
    let config = ConfigBuilder::new()
        .with_secrets(secrets())
        .with_trust_proxy(trust_proxy)
        .build()
        .unwrap();
    App::builder().with_config(config).build().unwrap().into_router()
}

fn delivery() -> serde_json::Value {
    json!({
        "Id": "1",
        "Attempt": 1,
        "Properties": {},
        "Notifications": [
            {"Action": "created", "Order": 42},
            {"Action": "updated"}
        ]
    })
}

#[tokio::test]
async fn test_handshake_echoes_value() {
    testing::get(app(), BASE)
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_ok()
        .assert_body("ping123")
        .await;
}

#[tokio::test]
async fn test_handshake_without_echo() {
    testing::get(app(), BASE)
        .execute()
        .await
        .assert_bad_request()
        .assert_body("No Echo Provided")
        .await;
}

#[tokio::test]
async fn test_handshake_for_unknown_id() {
    testing::get(app(), &format!("{}/nobody", BASE))
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_bad_request()
        .assert_body("Invalid Request")
        .await;
}

#[tokio::test]
async fn test_signed_delivery_reaches_handler() {
    let handler = Arc::new(RecordingHandler::default());
    let app = app_with(handler.clone());

    testing::post(app, BASE)
        .json_body(&delivery())
        .signed(SECRET)
        .execute()
        .await
        .assert_ok()
        .assert_body("")
        .await;

    let seen = handler.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].receiver, "custom");
    assert_eq!(seen[0].receiver_id, "");
    assert_eq!(seen[0].actions, vec!["created", "updated"]);
    assert_eq!(seen[0].payload["Notifications"][0]["Order"], 42);
}

#[tokio::test]
async fn test_receiver_name_is_case_insensitive() {
    testing::post(app(), "/api/webhooks/incoming/CUSTOM")
        .json_body(&delivery())
        .signed(SECRET)
        .execute()
        .await
        .assert_ok();
}

#[tokio::test]
async fn test_named_id_uses_its_own_secret() {
    let handler = Arc::new(RecordingHandler::default());
    let app = app_with(handler.clone());
    let path = format!("{}/partner", BASE);

    testing::post(app.clone(), &path)
        .json_body(&delivery())
        .signed(PARTNER_SECRET)
        .execute()
        .await
        .assert_ok();

    testing::post(app, &path)
        .json_body(&delivery())
        .signed(SECRET)
        .execute()
        .await
        .assert_bad_request()
        .assert_body("Bad Signature")
        .await;

    let seen = handler.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].receiver_id, "partner");
}

#[tokio::test]
async fn test_unsigned_delivery_rejected() {
    let handler = Arc::new(RecordingHandler::default());

    testing::post(app_with(handler.clone()), BASE)
        .json_body(&delivery())
        .execute()
        .await
        .assert_bad_request()
        .assert_body("Invalid Signature")
        .await;

    assert!(handler.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_algorithm_tag_rejected() {
    let body = serde_json::to_vec(&delivery()).unwrap();
    let signature = sign_payload(SECRET, &body).replacen("sha256", "sha1", 1);

    testing::post(app(), BASE)
        .raw_body(body)
        .header("content-type", "application/json")
        .header("ms-signature", &signature)
        .execute()
        .await
        .assert_bad_request()
        .assert_body("Invalid Signature")
        .await;
}

#[tokio::test]
async fn test_non_hex_signature_rejected() {
    testing::post(app(), BASE)
        .json_body(&delivery())
        .header("ms-signature", "sha256=not-hex-at-all")
        .execute()
        .await
        .assert_bad_request()
        .assert_body("Bad Encoding")
        .await;
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let signature = sign_payload(SECRET, br#"{"Notifications":[]}"#);

    testing::post(app(), BASE)
        .raw_body(r#"{"Notifications":[{"Action":"deleted"}]}"#)
        .header("content-type", "application/json")
        .header("ms-signature", &signature)
        .execute()
        .await
        .assert_bad_request()
        .assert_body("Bad Signature")
        .await;
}

#[tokio::test]
async fn test_invalid_json_after_valid_signature() {
    testing::post(app(), BASE)
        .raw_body("{not json")
        .header("content-type", "application/json")
        .signed(SECRET)
        .execute()
        .await
        .assert_bad_request()
        .assert_body("The WebHook request contained invalid JSON.")
        .await;
}

#[tokio::test]
async fn test_non_json_content_type_rejected() {
    testing::post(app(), BASE)
        .text_body(r#"{"Notifications":[]}"#)
        .header("content-type", "text/plain")
        .signed(SECRET)
        .execute()
        .await
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_unsupported_method_rejected() {
    testing::put(app(), BASE)
        .json_body(&delivery())
        .signed(SECRET)
        .execute()
        .await
        .assert_bad_request()
        .assert_body("Invalid WebHook Request")
        .await;
}

#[tokio::test]
async fn test_unknown_receiver_not_found() {
    testing::post(app(), "/api/webhooks/incoming/github")
        .json_body(&delivery())
        .signed(SECRET)
        .execute()
        .await
        .assert_not_found()
        .assert_body("No WebHook receiver is registered with the name 'github'.")
        .await;
}

#[tokio::test]
async fn test_handler_error_returns_server_error() {
    let body = testing::post(app_with(Arc::new(FailingHandler)), BASE)
        .json_body(&delivery())
        .signed(SECRET)
        .execute()
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .body_string()
        .await;

    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "Internal server error");
    assert!(body["error_id"].is_string());
}

#[tokio::test]
async fn test_plain_http_rejected_when_https_required() {
    testing::get(https_app(), BASE)
        .peer(REMOTE_PEER)
        .header("host", "hooks.example.com")
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_bad_request()
        .assert_contains("requires HTTPS")
        .await;
}

#[tokio::test]
async fn test_unknown_peer_rejected_when_https_required() {
    testing::get(https_app(), BASE)
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_bad_request()
        .assert_contains("requires HTTPS")
        .await;
}

#[tokio::test]
async fn test_client_supplied_headers_do_not_pass_gate() {
    testing::get(https_app(), BASE)
        .peer(REMOTE_PEER)
        .header("host", "localhost")
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_bad_request();

    testing::get(https_app(), BASE)
        .peer(REMOTE_PEER)
        .header("host", "hooks.example.com")
        .header("x-forwarded-proto", "https")
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_bad_request();

    let absolute = "https://localhost/api/webhooks/incoming/custom?echo=ping123";
    testing::get(https_app(), absolute)
        .peer(REMOTE_PEER)
        .execute()
        .await
        .assert_bad_request();
}

#[tokio::test]
async fn test_forwarded_https_passes_gate_behind_trusted_proxy() {
    testing::get(gated_app(true), BASE)
        .peer("10.0.0.5:40000")
        .header("host", "hooks.example.com")
        .header("x-forwarded-proto", "https")
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_ok()
        .assert_body("ping123")
        .await;
}

#[tokio::test]
async fn test_loopback_peer_passes_gate() {
    testing::get(https_app(), BASE)
        .peer("127.0.0.1:51234")
        .header("host", "hooks.example.com")
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_ok()
        .assert_body("ping123")
        .await;
}

#[tokio::test]
async fn test_response_carries_request_id() {
    testing::get(app(), BASE)
        .with_query(&[("echo", "ping123")])
        .execute()
        .await
        .assert_has_header("x-request-id");
}
