//! Alba-style HTTP testing utilities for receiver routers
//!
//! Requests are driven through the router with `oneshot`, no server needed.
//!
//! # Example
//!
//! ```rust,ignore
//! use hookwise::testing;
//!
//! #[tokio::test]
//! async fn test_handshake() {
//!     let app = build_app();
//!
//!     testing::get(app, "/api/webhooks/incoming/custom")
//!         .with_query(&[("echo", "ping123")])
//!         .execute()
//!         .await
//!         .assert_ok()
//!         .assert_body("ping123")
//!         .await;
//! }
//! ```

use axum::{
    Router,
    body::{Body, Bytes},
    extract::ConnectInfo,
    http::{HeaderName, Method, Request, StatusCode, header},
};
use serde::Serialize;
use std::net::SocketAddr;
use tower::ServiceExt;

use crate::webhooks::{compute_signature, hex_encode};

/// Default signature header used by [`Scenario::signed`]
pub const SIGNATURE_HEADER: &str = "ms-signature";

/// `sha256=<hex>` signature header value for `body` under `secret`
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    format!(
        "sha256={}",
        hex_encode(compute_signature(secret.as_bytes(), body))
    )
}

/// Alba-style test scenario builder for easy endpoint testing
pub struct Scenario {
    app: Router,
    request: Request<Body>,
    body: Bytes,
}

impl Scenario {
    /// Create a new test scenario with the given app
    pub fn new(app: Router) -> Self {
        Self {
            app,
            request: Request::builder()
                .method(Method::GET)
                .uri("/")
                .body(Body::empty())
                .unwrap(),
            body: Bytes::new(),
        }
    }

    /// Set the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        *self.request.method_mut() = method;
        self
    }

    /// Set the URI/path
    pub fn uri(mut self, uri: &str) -> Self {
        *self.request.uri_mut() = uri.parse().unwrap();
        self
    }

    /// Add a header
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.request.headers_mut().insert(
            HeaderName::from_bytes(key.as_bytes()).unwrap(),
            value.parse().unwrap(),
        );
        self
    }

    /// Set the peer address the request appears to come from
    pub fn peer(mut self, addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().unwrap();
        self.request.extensions_mut().insert(ConnectInfo(addr));
        self
    }

    /// Add query parameters to the request URI
    pub fn with_query(mut self, params: &[(&str, &str)]) -> Self {
        let uri = self.request.uri().clone();
        let mut query_parts = vec![];

        if let Some(query) = uri.query() {
            query_parts.push(query.to_string());
        }

        for (key, value) in params {
            query_parts.push(format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }

        let path = uri.path();
        let new_uri = if query_parts.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query_parts.join("&"))
        };

        *self.request.uri_mut() = new_uri.parse().unwrap();
        self
    }

    /// Set JSON body from a serializable type
    pub fn json_body<T: Serialize>(self, body: &T) -> Self {
        let json = serde_json::to_vec(body).unwrap();
        self.raw_body(json)
            .header(header::CONTENT_TYPE.as_str(), "application/json")
    }

    /// Set plain text body
    pub fn text_body(self, body: impl Into<String>) -> Self {
        self.raw_body(body.into())
    }

    /// Set the body to exactly these bytes
    pub fn raw_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sign the current body with `secret` in the default signature header
    pub fn signed(self, secret: &str) -> Self {
        self.signed_in(SIGNATURE_HEADER, secret)
    }

    /// Sign the current body with `secret` in a custom header
    pub fn signed_in(self, header_name: &str, secret: &str) -> Self {
        let signature = sign_payload(secret, &self.body);
        self.header(header_name, &signature)
    }

    /// Execute the request and get an assertion builder
    pub async fn execute(mut self) -> ScenarioAssert {
        *self.request.body_mut() = Body::from(self.body);
        let response = self.app.oneshot(self.request).await.unwrap();
        ScenarioAssert { response }
    }
}

/// Assertion builder for test responses
pub struct ScenarioAssert {
    response: axum::response::Response,
}

impl ScenarioAssert {
    /// Assert the response status code
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.response.status(),
            expected,
            "Expected status {}, got {}",
            expected,
            self.response.status()
        );
        self
    }

    /// Assert status is 200 OK
    pub fn assert_ok(self) -> Self {
        self.assert_status(StatusCode::OK)
    }

    /// Assert status is 400 Bad Request
    pub fn assert_bad_request(self) -> Self {
        self.assert_status(StatusCode::BAD_REQUEST)
    }

    /// Assert status is 404 Not Found
    pub fn assert_not_found(self) -> Self {
        self.assert_status(StatusCode::NOT_FOUND)
    }

    /// Assert a header exists with the given value
    pub fn assert_header(self, key: &str, expected: &str) -> Self {
        let value = self
            .response
            .headers()
            .get(key)
            .unwrap_or_else(|| panic!("Header '{}' not found", key))
            .to_str()
            .unwrap();
        assert_eq!(value, expected, "Header '{}' value mismatch", key);
        self
    }

    /// Assert a header is present, whatever its value
    pub fn assert_has_header(self, key: &str) -> Self {
        assert!(
            self.response.headers().contains_key(key),
            "Header '{}' not found",
            key
        );
        self
    }

    /// Get the response body as bytes
    pub async fn body_bytes(self) -> Vec<u8> {
        axum::body::to_bytes(self.response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    /// Get the response body as a string
    pub async fn body_string(self) -> String {
        String::from_utf8(self.body_bytes().await).unwrap()
    }

    /// Assert the response body is exactly `expected`
    pub async fn assert_body(self, expected: &str) -> Self {
        let status = self.response.status();
        let body = self.body_string().await;
        assert_eq!(body, expected, "Response body mismatch");

        let mut response = axum::response::Response::new(Body::from(body));
        *response.status_mut() = status;
        Self { response }
    }

    /// Assert the response body contains the given text
    pub async fn assert_contains(self, text: &str) -> Self {
        let status = self.response.status();
        let body = self.body_string().await;
        assert!(
            body.contains(text),
            "Response body does not contain '{}'. Body: {}",
            text,
            body
        );

        let mut response = axum::response::Response::new(Body::from(body));
        *response.status_mut() = status;
        Self { response }
    }

    /// Get the underlying response for custom assertions
    pub fn response(self) -> axum::response::Response {
        self.response
    }
}

/// Convenience function to create a GET request scenario
pub fn get(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::GET).uri(uri)
}

/// Convenience function to create a POST request scenario
pub fn post(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::POST).uri(uri)
}

/// Convenience function to create a PUT request scenario
pub fn put(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::PUT).uri(uri)
}

/// Convenience function to create a DELETE request scenario
pub fn delete(app: Router, uri: &str) -> Scenario {
    Scenario::new(app).method(Method::DELETE).uri(uri)
}
