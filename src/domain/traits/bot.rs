use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::ConnectionError;
use crate::domain::entities::{InboundEvent, Intents};

/// Receiver of gateway events.
///
/// Called from the gateway client's read path, so implementations must
/// hand work off instead of blocking.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: InboundEvent);
}

/// Gateway trait - abstraction over the real-time chat connection
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Open the connection and start delivering events to `sink`.
    ///
    /// Returns once the gateway has confirmed the session, or with an
    /// error when the token is rejected or the transport fails.
    async fn open(
        &self,
        token: &str,
        intents: Intents,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), ConnectionError>;

    /// Close the connection and stop event delivery
    async fn close(&self) -> Result<(), ConnectionError>;
}

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for Arc<T> {
    async fn open(
        &self,
        token: &str,
        intents: Intents,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), ConnectionError> {
        (**self).open(token, intents, sink).await
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        (**self).close().await
    }
}

/// Sends text back into a channel
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, channel_id: &str, text: &str) -> Result<(), ConnectionError>;
}
