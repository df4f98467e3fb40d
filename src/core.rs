use crate::{
    config::Config,
    error::Result,
    middleware::MakeRequestUuid,
    webhooks::{
        NoopHandler, ReceiverDispatcher, ReceiverState, SecretResolver, SecretStore,
        WebhookHandler, WebhookRoutes, WebhookVerifier,
    },
};
use axum::{Router, extract::DefaultBodyLimit};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

/// A ready-to-serve WebHook receiver application
pub struct App {
    router: Router,
    config: Config,
}

impl App {
    /// Builder pattern for constructing an App
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the fully layered router, e.g. for in-process testing
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start the application server
    pub async fn serve(self) -> std::result::Result<(), std::io::Error> {
        let addr = self
            .config
            .server
            .addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!(
            receiver = %self.config.receiver.name,
            base_path = %self.config.receiver.base_path,
            "WebHook receiver listening on http://{}",
            addr
        );

        // The HTTPS gate reads the peer address from ConnectInfo
        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

/// Builder for App with fluent API
#[must_use = "builder does nothing until you call build()"]
pub struct AppBuilder {
    config: Config,
    resolver: Option<Arc<dyn SecretResolver>>,
    verifier: Option<Arc<dyn WebhookVerifier>>,
    handler: Arc<dyn WebhookHandler>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            resolver: None,
            verifier: None,
            handler: Arc::new(NoopHandler),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Look secrets up through `resolver` instead of the configured secret string
    pub fn with_secret_resolver(mut self, resolver: Arc<dyn SecretResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the HMAC-SHA256 verifier
    pub fn with_verifier(mut self, verifier: Arc<dyn WebhookVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Handler invoked for every verified delivery
    pub fn with_handler(mut self, handler: Arc<dyn WebhookHandler>) -> Self {
        self.handler = handler;
        self
    }

    /// Assemble the router and its middleware stack
    ///
    /// # Errors
    ///
    /// Fails if no resolver was supplied and the configured secrets do not parse
    /// or violate the length bounds.
    pub fn build(self) -> Result<App> {
        let resolver: Arc<dyn SecretResolver> = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(SecretStore::from_config(&self.config.receiver)?),
        };

        let mut dispatcher = ReceiverDispatcher::new(self.config.receiver.clone(), resolver);
        if let Some(verifier) = self.verifier {
            dispatcher = dispatcher.with_verifier(verifier);
        }

        let state = ReceiverState::new(dispatcher, self.handler);
        let router = WebhookRoutes::new(state).register(Router::new());

        Ok(App {
            router: with_middleware(router, &self.config),
            config: self.config,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the middleware stack (outermost last)
fn with_middleware(router: Router, config: &Config) -> Router {
    router
        // Bounds the single in-memory read of the raw body
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give in-flight deliveries a grace period to finish
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!("Shutdown complete");
}
