use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::encoding::hex_decode;
use super::secrets::SecretResolver;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm tag accepted in the signature header by default
pub const DEFAULT_ALGORITHM: &str = "sha256";

/// Why a delivery failed signature verification
///
/// Every variant is a client error: the request is answered with 400 and the
/// reason text from [`SignatureError::reason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Header missing, not `tag=digest`, or tag is not the supported algorithm
    #[error("malformed signature header")]
    InvalidHeader,

    /// Digest is not valid hex
    #[error("signature digest is not valid hex")]
    BadEncoding,

    /// No secret configured for the receiver id
    #[error("no secret configured for receiver")]
    MissingSecret,

    /// Digest does not match the body
    #[error("signature does not match payload")]
    Mismatch,
}

impl SignatureError {
    /// Plain-text body sent with the 400 response
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidHeader => "Invalid Signature",
            Self::BadEncoding => "Bad Encoding",
            Self::MissingSecret => "Invalid Request",
            Self::Mismatch => "Bad Signature",
        }
    }
}

/// Trait for verifying webhook signatures
///
/// The dispatcher only depends on this seam, so deployments with a different
/// signing scheme can plug in their own verifier.
#[async_trait]
pub trait WebhookVerifier: Send + Sync {
    /// Verify `signature` (the raw header value, if any) against the exact
    /// bytes received on the wire for the given receiver id.
    async fn verify_signature(
        &self,
        receiver_id: &str,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<(), SignatureError>;

    /// Convenience wrapper returning `true` only if every check passed
    async fn is_valid(&self, receiver_id: &str, payload: &[u8], signature: &str) -> bool {
        self.verify_signature(receiver_id, payload, Some(signature))
            .await
            .is_ok()
    }
}

/// HMAC-SHA256 verifier for `<algorithm>=<hex digest>` signature headers
///
/// Secrets are looked up per receiver id through a [`SecretResolver`], so one
/// endpoint can serve several subscribers with distinct secrets.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use hookwise::webhooks::{HmacSha256Verifier, SecretStore, WebhookVerifier};
///
/// let store = SecretStore::parse("custom", "0123456789abcdef0123456789abcdef", 32, 128)?;
/// let verifier = HmacSha256Verifier::new("custom", Arc::new(store));
///
/// let valid = verifier.is_valid("", body, "sha256=9f86d0...").await;
/// ```
pub struct HmacSha256Verifier {
    receiver: String,
    algorithm: String,
    resolver: Arc<dyn SecretResolver>,
}

impl HmacSha256Verifier {
    pub fn new(receiver: impl Into<String>, resolver: Arc<dyn SecretResolver>) -> Self {
        Self {
            receiver: receiver.into(),
            algorithm: DEFAULT_ALGORITHM.to_string(),
            resolver,
        }
    }

    /// Accept a different algorithm tag in the signature header
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }
}

impl std::fmt::Debug for HmacSha256Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256Verifier")
            .field("receiver", &self.receiver)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Split a `tag=hexdigest` header into the decoded digest.
///
/// The tag must match `algorithm` case-insensitively and the value must contain
/// exactly one `=`.
pub fn parse_signature_header(value: &str, algorithm: &str) -> Result<Vec<u8>, SignatureError> {
    let parts: Vec<&str> = value.trim().split('=').collect();
    if parts.len() != 2 {
        return Err(SignatureError::InvalidHeader);
    }

    if !parts[0].trim().eq_ignore_ascii_case(algorithm) {
        return Err(SignatureError::InvalidHeader);
    }

    hex_decode(parts[1].trim()).map_err(|_| SignatureError::BadEncoding)
}

/// Compute the HMAC-SHA256 of `payload` keyed with `secret`
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Constant-time comparison to prevent timing attacks
///
/// Only the length check may exit early; the contents are compared with
/// `subtle`, which keeps LLVM from turning the fold back into branches.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

#[async_trait]
impl WebhookVerifier for HmacSha256Verifier {
    async fn verify_signature(
        &self,
        receiver_id: &str,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<(), SignatureError> {
        let Some(header) = signature else {
            tracing::debug!(
                receiver = %self.receiver,
                receiver_id,
                "WebHook request is missing the signature header"
            );
            return Err(SignatureError::InvalidHeader);
        };

        let expected = parse_signature_header(header, &self.algorithm).inspect_err(|err| {
            tracing::debug!(
                receiver = %self.receiver,
                receiver_id,
                error = %err,
                "Rejected WebHook signature header"
            );
        })?;

        let Some(secret) = self.resolver.resolve(&self.receiver, receiver_id).await else {
            tracing::error!(
                receiver = %self.receiver,
                receiver_id,
                "No secret configured for WebHook receiver"
            );
            return Err(SignatureError::MissingSecret);
        };

        let actual = compute_signature(secret.expose_secret().as_bytes(), payload);

        if !constant_time_compare(&expected, &actual) {
            tracing::debug!(
                receiver = %self.receiver,
                receiver_id,
                "WebHook signature verification failed"
            );
            return Err(SignatureError::Mismatch);
        }

        Ok(())
    }
}
