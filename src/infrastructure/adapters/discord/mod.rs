//! Discord adapter

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::builder::CreateMessage;
use serenity::gateway::ShardManager;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::{GatewayIntents, Ready};
use serenity::model::id::ChannelId;
use serenity::prelude::*;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::application::errors::ConnectionError;
use crate::domain::entities::{BotIdentity, ChatMessage, InboundEvent, Intents};
use crate::domain::traits::{EventSink, Gateway, Responder};

/// Discord messages are capped at 2000 characters
const MAX_MESSAGE_CHARS: usize = 2000;

/// Forwards serenity events into the domain event sink
struct EventForwarder {
    sink: Arc<dyn EventSink>,
    ready_tx: watch::Sender<bool>,
}

#[async_trait]
impl EventHandler for EventForwarder {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.sink.deliver(InboundEvent::Ready(BotIdentity {
            id: ready.user.id.to_string(),
            username: ready.user.name.clone(),
        }));
        self.ready_tx.send_replace(true);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let self_id = ctx.cache.current_user().id;
        self.sink.deliver(InboundEvent::MessageCreate(
            ChatMessage::new(
                msg.channel_id.to_string(),
                msg.author.id.to_string(),
                msg.author.name.clone(),
                msg.content.clone(),
            )
            .from_self(msg.author.id == self_id),
        ));
    }
}

struct Running {
    shard_manager: Arc<ShardManager>,
    runner: JoinHandle<Result<(), serenity::Error>>,
}

/// Discord gateway connection backed by serenity
pub struct DiscordGateway {
    ready_timeout: Duration,
    running: Mutex<Option<Running>>,
}

impl DiscordGateway {
    pub fn new(ready_timeout: Duration) -> Self {
        Self {
            ready_timeout,
            running: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Gateway for DiscordGateway {
    async fn open(
        &self,
        token: &str,
        intents: Intents,
        sink: Arc<dyn EventSink>,
    ) -> Result<(), ConnectionError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Ok(());
        }

        let (ready_tx, mut ready_rx) = watch::channel(false);
        let handler = EventForwarder { sink, ready_tx };

        let mut client = Client::builder(token, GatewayIntents::from_bits_truncate(intents.bits()))
            .event_handler(handler)
            .await
            .map_err(|e| ConnectionError::Rejected(format!("Failed to create Discord client: {}", e)))?;

        let shard_manager = client.shard_manager.clone();
        let mut runner = tokio::spawn(async move { client.start().await });

        tracing::info!("Starting Discord gateway connection...");

        tokio::select! {
            joined = &mut runner => {
                return Err(match joined {
                    Ok(Ok(())) => ConnectionError::Transport("gateway stopped before ready".to_string()),
                    Ok(Err(e)) => ConnectionError::Rejected(e.to_string()),
                    Err(e) => ConnectionError::Transport(e.to_string()),
                });
            }
            ready = async { ready_rx.wait_for(|ready| *ready).await.map(|_| ()) } => {
                if ready.is_err() {
                    shard_manager.shutdown_all().await;
                    return Err(ConnectionError::Transport("event handler dropped before ready".to_string()));
                }
            }
            _ = tokio::time::sleep(self.ready_timeout) => {
                shard_manager.shutdown_all().await;
                runner.abort();
                return Err(ConnectionError::Timeout(self.ready_timeout));
            }
        }

        *running = Some(Running { shard_manager, runner });
        Ok(())
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        let Some(Running { shard_manager, runner }) = self.running.lock().await.take() else {
            return Err(ConnectionError::NotConnected);
        };

        tracing::info!("Stopping Discord client...");
        shard_manager.shutdown_all().await;

        match runner.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ConnectionError::Transport(e.to_string())),
            Err(e) => Err(ConnectionError::Transport(e.to_string())),
        }
    }
}

/// Sends replies through the Discord REST API
pub struct DiscordResponder {
    http: Arc<Http>,
}

impl DiscordResponder {
    pub fn new(token: &str) -> Self {
        Self {
            http: Arc::new(Http::new(token)),
        }
    }
}

#[async_trait]
impl Responder for DiscordResponder {
    async fn reply(&self, channel_id: &str, text: &str) -> Result<(), ConnectionError> {
        let id = channel_id
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| ConnectionError::Transport(format!("invalid channel id {:?}", channel_id)))?;

        let content: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
        ChannelId::new(id)
            .send_message(&*self.http, CreateMessage::new().content(content))
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        Ok(())
    }
}
