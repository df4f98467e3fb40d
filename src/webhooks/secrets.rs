//! Shared-secret lookup for receivers.
//!
//! A single deployed endpoint can serve several subscribers, each signing with
//! its own secret, so secrets are addressed by `(receiver name, id)`. The empty
//! id is the default secret.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::config::ReceiverConfig;
use crate::error::ConfigError;

/// Looks up the shared secret for a receiver instance.
///
/// Implement this to back secrets with a vault, a database or anything else
/// the host provides. `None` means no secret is configured and the request must
/// be rejected.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, receiver: &str, id: &str) -> Option<SecretString>;
}

/// In-memory secret store loaded from the comma-separated configuration format.
///
/// Each entry is either a bare secret (the default, no-id secret) or
/// `id=secret`. Only the first `=` separates the id, so secrets may contain `=`.
///
/// ```rust
/// use hookwise::webhooks::SecretStore;
///
/// let store = SecretStore::parse(
///     "custom",
///     "default-secret-0123456789abcdef0123,alpha=alpha-secret-0123456789abcdef0123",
///     32,
///     128,
/// )
/// .unwrap();
/// assert_eq!(store.len(), 2);
/// ```
#[derive(Default)]
pub struct SecretStore {
    secrets: HashMap<(String, String), SecretString>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single receiver's secret configuration, validating each secret's
    /// byte length against `[min_len, max_len]`.
    pub fn parse(
        receiver: &str,
        value: &str,
        min_len: usize,
        max_len: usize,
    ) -> Result<Self, ConfigError> {
        let mut store = Self::new();
        store.load(receiver, value, min_len, max_len)?;
        Ok(store)
    }

    /// Build a store from the receiver section of the application config
    pub fn from_config(config: &ReceiverConfig) -> Result<Self, ConfigError> {
        Self::parse(
            &config.name,
            &config.secrets,
            config.secret_min_len,
            config.secret_max_len,
        )
    }

    /// Add another receiver's secrets to this store.
    ///
    /// Nothing is inserted unless every entry is valid.
    pub fn load(
        &mut self,
        receiver: &str,
        value: &str,
        min_len: usize,
        max_len: usize,
    ) -> Result<(), ConfigError> {
        if min_len == 0 || min_len > max_len {
            return Err(ConfigError::InvalidBounds {
                min: min_len,
                max: max_len,
            });
        }

        let receiver = normalize(receiver);
        if receiver.is_empty() {
            return Err(ConfigError::EmptyReceiverName);
        }

        let mut parsed: Vec<(String, String)> = Vec::new();
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, secret) = match entry.split_once('=') {
                Some((id, secret)) => (normalize(id), secret.trim()),
                None => (String::new(), entry),
            };

            let len = secret.len();
            if len < min_len || len > max_len {
                return Err(ConfigError::SecretLength {
                    receiver: receiver.clone(),
                    id,
                    len,
                    min: min_len,
                    max: max_len,
                });
            }

            if parsed.iter().any(|(existing, _)| *existing == id) {
                tracing::warn!(
                    receiver = %receiver,
                    receiver_id = %id,
                    "Duplicate WebHook secret entry, the last one wins"
                );
            }
            parsed.push((id, secret.to_string()));
        }

        for (id, secret) in parsed {
            self.secrets
                .insert((receiver.clone(), id), SecretString::from(secret));
        }

        Ok(())
    }

    /// Insert a secret without length validation
    pub fn insert(&mut self, receiver: &str, id: &str, secret: impl Into<String>) {
        self.secrets.insert(
            (normalize(receiver), normalize(id)),
            SecretString::from(secret.into()),
        );
    }

    pub fn get(&self, receiver: &str, id: &str) -> Option<&SecretString> {
        self.secrets.get(&(normalize(receiver), normalize(id)))
    }

    pub fn contains(&self, receiver: &str, id: &str) -> bool {
        self.get(receiver, id).is_some()
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<String> = self
            .secrets
            .keys()
            .map(|(receiver, id)| format!("{}/{}", receiver, id))
            .collect();
        ids.sort();
        f.debug_struct("SecretStore").field("ids", &ids).finish()
    }
}

#[async_trait]
impl SecretResolver for SecretStore {
    async fn resolve(&self, receiver: &str, id: &str) -> Option<SecretString> {
        self.get(receiver, id)
            .map(|secret| SecretString::from(secret.expose_secret().to_owned()))
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}
