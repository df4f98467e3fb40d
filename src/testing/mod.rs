//! Testing utilities for hookwise receivers
//!
//! - Alba-style HTTP endpoint testing without running a server
//! - Signature helpers for building signed deliveries
//!
//! # Example
//!
//! ```rust,ignore
//! use hookwise::testing;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_delivery() {
//!     let app = build_app();
//!
//!     testing::post(app, "/api/webhooks/incoming/custom")
//!         .json_body(&json!({"Notifications": [{"Action": "created"}]}))
//!         .signed(SECRET)
//!         .execute()
//!         .await
//!         .assert_ok();
//! }
//! ```

mod scenario;

pub use scenario::{
    SIGNATURE_HEADER, Scenario, ScenarioAssert, delete, get, post, put, sign_payload,
};
