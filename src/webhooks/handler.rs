use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// A verified delivery, normalized for downstream handlers
///
/// Built once per successfully verified POST and dropped with the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerContext {
    /// Receiver name the delivery was addressed to
    pub receiver: String,
    /// Receiver id from the URL (empty for the default receiver)
    pub receiver_id: String,
    /// Action names in payload order
    pub actions: Vec<String>,
    /// The parsed request body
    pub payload: Value,
}

impl HandlerContext {
    pub fn new(
        receiver: impl Into<String>,
        receiver_id: impl Into<String>,
        actions: Vec<String>,
        payload: Value,
    ) -> Self {
        Self {
            receiver: receiver.into(),
            receiver_id: receiver_id.into(),
            actions,
            payload,
        }
    }

    /// Whether the delivery carries the given action
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    /// Deserialize the payload into a typed structure
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Trait for handling verified deliveries
///
/// # Example
///
/// ```rust,ignore
/// use hookwise::webhooks::{HandlerContext, WebhookHandler};
///
/// struct OrderHandler {
///     db: DatabaseConnection,
/// }
///
/// #[async_trait]
/// impl WebhookHandler for OrderHandler {
///     async fn handle(&self, context: &HandlerContext) -> Result<()> {
///         if context.has_action("order.created") {
///             // ...
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Handle the delivery
    async fn handle(&self, context: &HandlerContext) -> Result<()>;

    /// Optional: Handle errors that occur during processing
    async fn on_error(&self, context: &HandlerContext, error: &crate::error::ReceiverError) {
        tracing::error!(
            receiver = %context.receiver,
            receiver_id = %context.receiver_id,
            actions = ?context.actions,
            error = %error,
            "WebHook processing failed"
        );
    }
}

/// Handler that only logs the actions it receives
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

#[async_trait]
impl WebhookHandler for NoopHandler {
    async fn handle(&self, context: &HandlerContext) -> Result<()> {
        tracing::info!(
            receiver = %context.receiver,
            receiver_id = %context.receiver_id,
            actions = ?context.actions,
            "WebHook received"
        );
        Ok(())
    }
}

/// Run `handler` for `context`, reporting failures through `on_error`
pub async fn run_handler(handler: &dyn WebhookHandler, context: &HandlerContext) -> Result<()> {
    match handler.handle(context).await {
        Ok(()) => Ok(()),
        Err(e) => {
            handler.on_error(context, &e).await;
            Err(e)
        }
    }
}
