use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::{ConfigError, Result};
use crate::utils::{get_env_flag, get_env_with_prefix};

/// Main configuration for a hookwise receiver
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub receiver: ReceiverConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 10MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

/// Settings for the WebHook receiver endpoint.
///
/// Everything the dispatcher needs is carried here so a receiver can be built
/// and tested without any ambient state.
#[derive(Clone, Deserialize, Serialize)]
pub struct ReceiverConfig {
    /// Receiver name matched against the `{receiver}` path segment
    #[serde(default = "default_receiver_name")]
    pub name: String,

    /// Path prefix the receiver routes are nested under
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Header carrying `<algorithm>=<hex digest>`
    #[serde(default = "default_signature_header")]
    pub signature_header: String,

    /// Algorithm tag accepted in the signature header (compared case-insensitively)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Query parameter echoed back during the GET handshake
    #[serde(default = "default_echo_param")]
    pub echo_param: String,

    #[serde(default = "default_secret_min_len")]
    pub secret_min_len: usize,

    #[serde(default = "default_secret_max_len")]
    pub secret_max_len: usize,

    /// Reject plain-HTTP requests from non-loopback peers
    #[serde(default = "default_require_https")]
    pub require_https: bool,

    /// Honour `X-Forwarded-Proto` from a TLS-terminating proxy.
    ///
    /// Only enable this when every request arrives through such a proxy;
    /// otherwise clients can claim HTTPS themselves.
    #[serde(default)]
    pub trust_proxy: bool,

    /// Comma-separated `secret` / `id=secret` entries
    #[serde(default, skip_serializing)]
    pub secrets: String,
}

impl std::fmt::Debug for ReceiverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverConfig")
            .field("name", &self.name)
            .field("base_path", &self.base_path)
            .field("signature_header", &self.signature_header)
            .field("algorithm", &self.algorithm)
            .field("echo_param", &self.echo_param)
            .field("secret_min_len", &self.secret_min_len)
            .field("secret_max_len", &self.secret_max_len)
            .field("require_https", &self.require_https)
            .field("trust_proxy", &self.trust_proxy)
            .field("secrets", &"[REDACTED]")
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            name: default_receiver_name(),
            base_path: default_base_path(),
            signature_header: default_signature_header(),
            algorithm: default_algorithm(),
            echo_param: default_echo_param(),
            secret_min_len: default_secret_min_len(),
            secret_max_len: default_secret_max_len(),
            require_https: default_require_https(),
            trust_proxy: false,
            secrets: String::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_receiver_name() -> String {
    "custom".to_string()
}

fn default_base_path() -> String {
    "/api/webhooks/incoming".to_string()
}

fn default_signature_header() -> String {
    "ms-signature".to_string()
}

fn default_algorithm() -> String {
    "sha256".to_string()
}

fn default_echo_param() -> String {
    "echo".to_string()
}

fn default_secret_min_len() -> usize {
    32
}

fn default_secret_max_len() -> usize {
    128
}

fn default_require_https() -> bool {
    true
}

impl ServerConfig {
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set the maximum request body size in bytes
    ///
    /// The raw body is buffered in memory once per request for hashing, so this
    /// bounds the memory a single delivery can consume.
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.config.server.max_body_size = max_body_size;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_receiver(mut self, receiver: ReceiverConfig) -> Self {
        self.config.receiver = receiver;
        self
    }

    pub fn with_receiver_name(mut self, name: impl Into<String>) -> Self {
        self.config.receiver.name = name.into();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.receiver.base_path = base_path.into();
        self
    }

    pub fn with_signature_header(mut self, header: impl Into<String>) -> Self {
        self.config.receiver.signature_header = header.into();
        self
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.config.receiver.algorithm = algorithm.into();
        self
    }

    pub fn with_echo_param(mut self, param: impl Into<String>) -> Self {
        self.config.receiver.echo_param = param.into();
        self
    }

    pub fn with_secret_bounds(mut self, min: usize, max: usize) -> Self {
        self.config.receiver.secret_min_len = min;
        self.config.receiver.secret_max_len = max;
        self
    }

    pub fn with_require_https(mut self, enabled: bool) -> Self {
        self.config.receiver.require_https = enabled;
        self
    }

    /// Trust `X-Forwarded-Proto` set by a TLS-terminating proxy
    pub fn with_trust_proxy(mut self, enabled: bool) -> Self {
        self.config.receiver.trust_proxy = enabled;
        self
    }

    /// Set the comma-separated secret configuration (`secret,id=secret,...`)
    pub fn with_secrets(mut self, secrets: impl Into<String>) -> Self {
        self.config.receiver.secrets = secrets.into();
        self
    }

    /// Load configuration from environment variables with HOOKWISE_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(max_body_size) = get_env_with_prefix("MAX_BODY_SIZE") {
            if let Ok(size) = max_body_size.parse() {
                self.config.server.max_body_size = size;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_flag("LOG_JSON") {
            self.config.logging.json = json;
        }

        let receiver = &mut self.config.receiver;
        if let Some(name) = get_env_with_prefix("RECEIVER_NAME") {
            receiver.name = name;
        }
        if let Some(base_path) = get_env_with_prefix("RECEIVER_BASE_PATH") {
            receiver.base_path = base_path;
        }
        if let Some(header) = get_env_with_prefix("SIGNATURE_HEADER") {
            receiver.signature_header = header;
        }
        if let Some(algorithm) = get_env_with_prefix("SIGNATURE_ALGORITHM") {
            receiver.algorithm = algorithm;
        }
        if let Some(param) = get_env_with_prefix("ECHO_PARAM") {
            receiver.echo_param = param;
        }
        if let Some(min) = get_env_with_prefix("SECRET_MIN_LENGTH").and_then(|v| v.parse().ok()) {
            receiver.secret_min_len = min;
        }
        if let Some(max) = get_env_with_prefix("SECRET_MAX_LENGTH").and_then(|v| v.parse().ok()) {
            receiver.secret_max_len = max;
        }
        if let Some(require_https) = get_env_flag("REQUIRE_HTTPS") {
            receiver.require_https = require_https;
        }
        if let Some(trust_proxy) = get_env_flag("TRUST_PROXY") {
            receiver.trust_proxy = trust_proxy;
        }
        if let Some(secrets) = get_env_with_prefix("RECEIVER_SECRETS") {
            receiver.secrets = secrets;
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// - Invalid server address, port or body limit
    /// - Unknown log level
    /// - Empty receiver name or a base path without a leading `/`
    /// - Secret length bounds that are empty or inverted
    pub fn build(self) -> Result<Config> {
        let server = &self.config.server;
        server
            .addr()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", server.host, server.port)))?;

        if server.port == 0 {
            return Err(ConfigError::InvalidAddress(format!("{}:{}", server.host, server.port)).into());
        }

        if server.max_body_size == 0 {
            return Err(ConfigError::InvalidBodyLimit.into());
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.config.logging.level.clone()).into());
        }

        let receiver = &self.config.receiver;
        if receiver.name.trim().is_empty() {
            return Err(ConfigError::EmptyReceiverName.into());
        }

        if !receiver.base_path.starts_with('/') {
            return Err(ConfigError::InvalidBasePath(receiver.base_path.clone()).into());
        }

        if receiver.secret_min_len == 0 || receiver.secret_min_len > receiver.secret_max_len {
            return Err(ConfigError::InvalidBounds {
                min: receiver.secret_min_len,
                max: receiver.secret_max_len,
            }
            .into());
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReceiverError;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.receiver.name, "custom");
        assert_eq!(config.receiver.signature_header, "ms-signature");
        assert_eq!(config.receiver.algorithm, "sha256");
        assert_eq!(config.receiver.echo_param, "echo");
        assert_eq!(config.receiver.secret_min_len, 32);
        assert_eq!(config.receiver.secret_max_len, 128);
        assert!(config.receiver.require_https);
        assert!(!config.receiver.trust_proxy);
    }

    #[test]
    fn test_builder_sets_receiver_fields() {
        let config = ConfigBuilder::new()
            .with_receiver_name("partner")
            .with_base_path("/hooks")
            .with_signature_header("x-signature")
            .with_algorithm("SHA256")
            .with_echo_param("challenge")
            .with_secret_bounds(16, 64)
            .with_require_https(false)
            .with_trust_proxy(true)
            .build()
            .unwrap();

        assert_eq!(config.receiver.name, "partner");
        assert_eq!(config.receiver.base_path, "/hooks");
        assert_eq!(config.receiver.signature_header, "x-signature");
        assert_eq!(config.receiver.algorithm, "SHA256");
        assert_eq!(config.receiver.echo_param, "challenge");
        assert_eq!(config.receiver.secret_min_len, 16);
        assert_eq!(config.receiver.secret_max_len, 64);
        assert!(!config.receiver.require_https);
        assert!(config.receiver.trust_proxy);
    }

    #[test]
    fn test_build_rejects_inverted_bounds() {
        let err = ConfigBuilder::new().with_secret_bounds(64, 32).build().unwrap_err();
        assert!(matches!(
            err,
            ReceiverError::Config(ConfigError::InvalidBounds { min: 64, max: 32 })
        ));
    }

    #[test]
    fn test_build_rejects_relative_base_path() {
        let err = ConfigBuilder::new().with_base_path("hooks").build().unwrap_err();
        assert!(matches!(err, ReceiverError::Config(ConfigError::InvalidBasePath(_))));
    }

    #[test]
    fn test_build_rejects_bad_log_level() {
        let err = ConfigBuilder::new().with_log_level("loud").build().unwrap_err();
        assert!(matches!(err, ReceiverError::Config(ConfigError::InvalidLogLevel(_))));
    }

    #[test]
    fn test_build_rejects_empty_receiver_name() {
        let err = ConfigBuilder::new().with_receiver_name("  ").build().unwrap_err();
        assert!(matches!(err, ReceiverError::Config(ConfigError::EmptyReceiverName)));
    }

    #[test]
    fn test_build_rejects_zero_port() {
        assert!(ConfigBuilder::new().with_port(0).build().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ConfigBuilder::new()
            .with_secrets("a-very-secret-value-that-nobody-should-see")
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("a-very-secret-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_secrets_not_serialized() {
        let config = ConfigBuilder::new().with_secrets("top-secret").build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("top-secret"));
    }

    #[test]
    fn test_from_env_reads_receiver_settings() {
        unsafe {
            std::env::set_var("HOOKWISE_RECEIVER_NAME", "fromenv");
            std::env::set_var("HOOKWISE_REQUIRE_HTTPS", "false");
            std::env::set_var("HOOKWISE_SECRET_MIN_LENGTH", "40");
        }

        let config = ConfigBuilder::new().from_env().build().unwrap();
        assert_eq!(config.receiver.name, "fromenv");
        assert!(!config.receiver.require_https);
        assert_eq!(config.receiver.secret_min_len, 40);

        unsafe {
            std::env::remove_var("HOOKWISE_RECEIVER_NAME");
            std::env::remove_var("HOOKWISE_REQUIRE_HTTPS");
            std::env::remove_var("HOOKWISE_SECRET_MIN_LENGTH");
        }
    }
}
