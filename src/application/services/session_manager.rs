//! Session manager - Drives the gateway lifecycle and orderly shutdown

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::errors::{BotError, ConfigError};
use crate::application::messaging::EventDispatcher;
use crate::domain::entities::{ConnectionState, Session};
use crate::domain::traits::{DocumentStore, Gateway};
use super::persistence::{PersistenceGateway, DEFAULT_STORAGE_TIMEOUT};

/// Connection targets and time bounds for a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub storage_uri: String,
    pub storage_timeout: Duration,
    pub shutdown_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            storage_uri: "mongodb://mongodb:27017".to_string(),
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// Owns the gateway connection and tears everything down in order.
///
/// Disconnected -> Connecting -> Connected -> Closing -> Disconnected
pub struct SessionManager<G: Gateway, S: DocumentStore> {
    session: Mutex<Session>,
    gateway: G,
    persistence: Arc<PersistenceGateway<S>>,
    dispatcher: Arc<EventDispatcher>,
    settings: SessionSettings,
}

impl<G: Gateway, S: DocumentStore> SessionManager<G, S> {
    pub fn new(
        session: Session,
        gateway: G,
        persistence: Arc<PersistenceGateway<S>>,
        dispatcher: Arc<EventDispatcher>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            gateway,
            persistence,
            dispatcher,
            settings,
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self.session.lock() {
            Ok(session) => session.state(),
            Err(poisoned) => poisoned.into_inner().state(),
        }
    }

    /// States visited so far, oldest first
    pub fn history(&self) -> Vec<ConnectionState> {
        match self.session.lock() {
            Ok(session) => session.history().to_vec(),
            Err(poisoned) => poisoned.into_inner().history().to_vec(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn persistence(&self) -> &Arc<PersistenceGateway<S>> {
        &self.persistence
    }

    pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    /// Open the gateway, then the document store.
    ///
    /// Any failure here is fatal; nothing is retried. A store failure
    /// closes the already-open gateway before returning.
    pub async fn start(&self) -> Result<(), BotError> {
        let (token, intents) = {
            let session = self.lock_session()?;
            if !session.has_token() {
                return Err(ConfigError::MissingToken.into());
            }
            (session.token().to_string(), session.intents())
        };

        self.transition(ConnectionState::Connecting)?;
        tracing::info!("Opening gateway connection");

        if let Err(e) = self.gateway.open(&token, intents, self.dispatcher.clone()).await {
            self.transition(ConnectionState::Closing)?;
            self.dispatcher.close();
            self.transition(ConnectionState::Disconnected)?;
            return Err(e.into());
        }

        if let Err(e) = self
            .persistence
            .connect(&self.settings.storage_uri, self.settings.storage_timeout)
            .await
        {
            self.transition(ConnectionState::Closing)?;
            self.dispatcher.close();
            self.close_gateway().await;
            self.transition(ConnectionState::Disconnected)?;
            return Err(e.into());
        }

        self.transition(ConnectionState::Connected)?;
        tracing::info!("Bot is now running. Press CTRL-C to exit.");
        Ok(())
    }

    /// Block until `signal` resolves, then tear down
    pub async fn await_shutdown<F>(&self, signal: F) -> Result<(), BotError>
    where
        F: Future<Output = ()>,
    {
        if self.state() != ConnectionState::Connected {
            return Err(BotError::InvalidState(format!(
                "cannot wait for shutdown while {}",
                self.state()
            )));
        }

        signal.await;
        tracing::info!("Shutdown signal received, shutting down...");
        self.shutdown().await
    }

    /// Orderly teardown. Failures are logged and never stop the sequence.
    pub async fn shutdown(&self) -> Result<(), BotError> {
        self.transition(ConnectionState::Closing)?;

        self.dispatcher.close();
        self.dispatcher.router().close();

        self.close_gateway().await;

        if !self.dispatcher.drain(self.settings.shutdown_timeout).await {
            tracing::warn!(
                "{} handler tasks still running after {:?}, not waiting for them",
                self.dispatcher.in_flight(),
                self.settings.shutdown_timeout
            );
        }

        if let Err(e) = self.persistence.disconnect(self.settings.storage_timeout).await {
            tracing::error!("Failed to disconnect document store: {}", e);
        }

        self.transition(ConnectionState::Disconnected)?;
        tracing::info!("Shutdown complete");
        Ok(())
    }

    async fn close_gateway(&self) {
        match tokio::time::timeout(self.settings.shutdown_timeout, self.gateway.close()).await {
            Ok(Ok(())) => tracing::info!("Gateway connection closed"),
            Ok(Err(e)) => tracing::error!("Failed to close gateway connection: {}", e),
            Err(_) => tracing::error!(
                "Gateway close timed out after {:?}",
                self.settings.shutdown_timeout
            ),
        }
    }

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, Session>, BotError> {
        self.session
            .lock()
            .map_err(|_| BotError::InvalidState("session lock poisoned".to_string()))
    }

    fn transition(&self, next: ConnectionState) -> Result<(), BotError> {
        let mut session = self.lock_session()?;
        let prev = session.transition(next).map_err(BotError::InvalidState)?;
        tracing::debug!("Session {} -> {}", prev, next);
        Ok(())
    }
}

/// Resolves on SIGINT or SIGTERM
pub async fn termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM ({}), only CTRL-C will stop the bot", e);
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Cannot listen for CTRL-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
