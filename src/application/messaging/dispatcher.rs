//! Event dispatcher - Fans gateway events out to handlers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::application::errors::CommandError;
use crate::application::services::MessageLogger;
use crate::domain::entities::{BotIdentity, ChatMessage, InboundEvent};
use crate::domain::traits::{EventSink, Responder};
use super::router::CommandRouter;

/// Routes each inbound event to its handlers on a separate task.
///
/// The logger and the command router each run in their own task per
/// message, so a failure or panic in one never reaches the other or the
/// gateway read loop.
pub struct EventDispatcher {
    logger: Arc<MessageLogger>,
    router: Arc<CommandRouter>,
    responder: Arc<dyn Responder>,
    self_id: RwLock<Option<String>>,
    accepting: AtomicBool,
    tracker: TaskTracker,
}

impl EventDispatcher {
    pub fn new(
        logger: Arc<MessageLogger>,
        router: Arc<CommandRouter>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            logger,
            router,
            responder,
            self_id: RwLock::new(None),
            accepting: AtomicBool::new(true),
            tracker: TaskTracker::new(),
        }
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    pub fn self_id(&self) -> Option<String> {
        self.self_id.read().ok().and_then(|id| id.clone())
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Number of handler tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Dispatch one event.
    ///
    /// Returns the handle of the spawned task, or `None` when the event
    /// needed no work or the dispatcher is closed.
    pub fn dispatch(&self, event: InboundEvent) -> Option<JoinHandle<()>> {
        if !self.is_accepting() {
            tracing::debug!("Dispatcher closed, dropping {} event", event.kind());
            return None;
        }

        match event {
            InboundEvent::Ready(identity) => {
                self.remember_self(&identity);
                let router = self.router.clone();
                Some(self.tracker.spawn(async move { on_ready(router, identity) }))
            }
            InboundEvent::MessageCreate(message) => {
                if self.is_own_message(&message) {
                    return None;
                }
                Some(self.spawn_message_handlers(message))
            }
        }
    }

    /// Stop accepting events; in-flight tasks keep running
    pub fn close(&self) {
        self.accepting.store(false, Ordering::Release);
        self.tracker.close();
    }

    /// Wait for in-flight tasks, up to `timeout`. Returns true if all finished.
    pub async fn drain(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.tracker.wait()).await.is_ok()
    }

    fn remember_self(&self, identity: &BotIdentity) {
        match self.self_id.write() {
            Ok(mut id) => *id = Some(identity.id.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(identity.id.clone()),
        }
    }

    fn is_own_message(&self, message: &ChatMessage) -> bool {
        if message.is_from_self {
            return true;
        }
        self.self_id
            .read()
            .map(|id| id.as_deref() == Some(message.author_id.as_str()))
            .unwrap_or(false)
    }

    fn spawn_message_handlers(&self, message: ChatMessage) -> JoinHandle<()> {
        let message = Arc::new(message);
        let logger = self.logger.clone();
        let router = self.router.clone();
        let responder = self.responder.clone();
        let tracker = self.tracker.clone();

        self.tracker.spawn(async move {
            let log_task = tracker.spawn(log_message(logger, message.clone()));
            let route_task = tracker.spawn(route_message(router, responder, message.clone()));

            let (logged, routed) = tokio::join!(log_task, route_task);
            if let Err(e) = logged {
                tracing::error!("[{}] Message logger task failed: {}", message.channel_id, e);
            }
            if let Err(e) = routed {
                tracing::error!("[{}] Command task failed: {}", message.channel_id, e);
            }
        })
    }
}

impl EventSink for EventDispatcher {
    fn deliver(&self, event: InboundEvent) {
        // Handle dropped on purpose; the tracker keeps the task accounted for
        let _ = self.dispatch(event);
    }
}

fn on_ready(router: Arc<CommandRouter>, identity: BotIdentity) {
    tracing::info!("We have logged in as {} ({})", identity.username, identity.id);
    for name in router.finalize() {
        tracing::info!("Loading {} command module...", name);
    }
}

async fn log_message(logger: Arc<MessageLogger>, message: Arc<ChatMessage>) {
    if let Err(e) = logger.log_message(&message).await {
        tracing::warn!("[{}] Chat log append failed: {}", message.channel_id, e);
    }
}

async fn route_message(
    router: Arc<CommandRouter>,
    responder: Arc<dyn Responder>,
    message: Arc<ChatMessage>,
) {
    // Handlers are synchronous; keep them off the async workers so a slow
    // one cannot stall the runtime or the shutdown timers
    let routed = {
        let router = router.clone();
        let message = message.clone();
        tokio::task::spawn_blocking(move || router.route(&message.content)).await
    };
    let routed = match routed {
        Ok(routed) => routed,
        Err(e) => {
            tracing::error!("[{}] Command handler failed: {}", message.channel_id, e);
            return;
        }
    };

    let reply = match routed {
        Ok(None) => return,
        Ok(Some(routed)) => {
            tracing::debug!("[{}] Handled {}{}", message.channel_id, router.prefix(), routed.command);
            routed.reply
        }
        Err(CommandError::UnknownCommand(name)) => {
            tracing::debug!("[{}] Unknown command {:?}", message.channel_id, name);
            format!("Unknown command: {}{}", router.prefix(), name)
        }
        Err(e) => {
            tracing::warn!("[{}] Command failed: {}", message.channel_id, e);
            format!("Command failed: {}", e)
        }
    };

    if let Err(e) = responder.reply(&message.channel_id, &reply).await {
        tracing::warn!("[{}] Failed to send reply: {}", message.channel_id, e);
    }
}
