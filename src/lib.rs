//! Hookwise - signed WebHook receiver built on Axum
//!
//! Hookwise receives WebHook deliveries from a sender that signs every
//! request body with a shared secret, in the style of the ASP.NET custom
//! WebHook senders.
//!
//! # Features
//!
//! - **Handshake**: `GET ?echo=<value>` is answered with the value itself
//! - **Verification**: HMAC-SHA256 over the raw body, `ms-signature: sha256=<hex>`
//! - **Actions**: `Notifications[].Action` extracted from the JSON payload
//! - **Gate**: plain-HTTP requests rejected unless from a loopback peer or a trusted proxy
//! - **Testing**: Alba-style HTTP testing utilities with request signing
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hookwise::{App, ConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> hookwise::Result<()> {
//!     hookwise::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     let app = App::builder().with_config(config).build()?;
//!
//!     app.serve().await.map_err(anyhow::Error::from)?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod middleware;
pub mod testing;
pub mod utils;
pub mod webhooks;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, LoggingConfig, ReceiverConfig, ServerConfig};
pub use core::{App, AppBuilder};
pub use error::{ConfigError, ReceiverError, Result};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main()
/// before creating the App.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "hookwise=debug")
/// - `HOOKWISE_LOG_JSON`: Set to "true" for JSON formatted logs
///
/// # Example
///
/// ```rust,no_run
/// #[tokio::main]
/// async fn main() {
///     hookwise::init_tracing();
///     // ... rest of your app
/// }
/// ```
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_flag("LOG_JSON").unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
