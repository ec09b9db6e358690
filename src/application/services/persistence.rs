//! Persistence gateway - Owns the document store connection

use std::sync::RwLock;
use std::time::Duration;

use crate::application::errors::StorageError;
use crate::domain::traits::DocumentStore;

/// Default bound for connect, ping and disconnect
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Single owner of the store handle.
///
/// Other components only ever get collection handles derived from it;
/// the connection itself is released exclusively through `disconnect`.
pub struct PersistenceGateway<S: DocumentStore> {
    store: S,
    database: String,
    handle: RwLock<Option<S::Handle>>,
}

impl<S: DocumentStore> PersistenceGateway<S> {
    pub fn new(store: S, database: impl Into<String>) -> Self {
        Self {
            store,
            database: database.into(),
            handle: RwLock::new(None),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn is_connected(&self) -> bool {
        self.handle.read().map(|h| h.is_some()).unwrap_or(false)
    }

    /// Connect and ping within `timeout`
    pub async fn connect(&self, uri: &str, timeout: Duration) -> Result<(), StorageError> {
        if self.is_connected() {
            tracing::warn!("Document store already connected, ignoring connect");
            return Ok(());
        }

        let handle = match tokio::time::timeout(timeout, self.connect_and_ping(uri)).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(StorageError::Unavailable(msg))) => return Err(StorageError::Unavailable(msg)),
            Ok(Err(e)) => return Err(StorageError::Unavailable(e.to_string())),
            Err(_) => {
                return Err(StorageError::Unavailable(format!(
                    "no response within {:?}",
                    timeout
                )))
            }
        };

        let mut slot = self.handle.write()
            .map_err(|_| StorageError::Driver("Lock poisoned".to_string()))?;
        *slot = Some(handle);

        tracing::info!("Successfully connected to document store (database: {})", self.database);
        Ok(())
    }

    async fn connect_and_ping(&self, uri: &str) -> Result<S::Handle, StorageError> {
        let handle = self.store.connect(uri, &self.database).await?;
        if let Err(e) = self.store.ping(&handle).await {
            if let Err(close_err) = self.store.disconnect(handle).await {
                tracing::debug!("Dropping unpingable connection failed: {}", close_err);
            }
            return Err(e);
        }
        Ok(handle)
    }

    /// Release the connection within `timeout`; a no-op when never connected
    pub async fn disconnect(&self, timeout: Duration) -> Result<(), StorageError> {
        let handle = match self.handle.write() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, self.store.disconnect(handle)).await {
            Ok(result) => {
                result?;
                tracing::info!("Disconnected from document store");
                Ok(())
            }
            Err(_) => Err(StorageError::Timeout(timeout)),
        }
    }

    /// Named collection in the connected database
    pub fn collection(&self, name: &str) -> Result<S::Collection, StorageError> {
        let slot = self.handle.read()
            .map_err(|_| StorageError::Driver("Lock poisoned".to_string()))?;
        let handle = slot.as_ref().ok_or(StorageError::NotConnected)?;
        Ok(self.store.collection(handle, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeStore {
        fail_ping: bool,
        hang_connect: bool,
        disconnects: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DocumentStore for FakeStore {
        type Handle = String;
        type Collection = String;

        async fn connect(&self, _uri: &str, database: &str) -> Result<String, StorageError> {
            if self.hang_connect {
                std::future::pending::<()>().await;
            }
            Ok(database.to_string())
        }

        async fn ping(&self, _handle: &String) -> Result<(), StorageError> {
            if self.fail_ping {
                return Err(StorageError::Driver("ping refused".to_string()));
            }
            Ok(())
        }

        async fn disconnect(&self, _handle: String) -> Result<(), StorageError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn collection(&self, handle: &String, name: &str) -> String {
            format!("{}.{}", handle, name)
        }
    }

    #[tokio::test]
    async fn collection_before_connect_fails_fast() {
        let gateway = PersistenceGateway::new(FakeStore::default(), "hots");
        assert!(matches!(gateway.collection("heroes"), Err(StorageError::NotConnected)));
    }

    #[tokio::test]
    async fn connect_then_lookup_then_disconnect() {
        let store = FakeStore::default();
        let disconnects = store.disconnects.clone();
        let gateway = PersistenceGateway::new(store, "hots");

        gateway.connect("mongodb://localhost", DEFAULT_STORAGE_TIMEOUT).await.unwrap();
        assert_eq!(gateway.collection("heroes").unwrap(), "hots.heroes");

        gateway.disconnect(DEFAULT_STORAGE_TIMEOUT).await.unwrap();
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert!(matches!(gateway.collection("heroes"), Err(StorageError::NotConnected)));

        // second disconnect is a no-op
        gateway.disconnect(DEFAULT_STORAGE_TIMEOUT).await.unwrap();
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_ping_is_unavailable_and_releases_client() {
        let store = FakeStore { fail_ping: true, ..Default::default() };
        let disconnects = store.disconnects.clone();
        let gateway = PersistenceGateway::new(store, "hots");

        let err = gateway.connect("mongodb://x", DEFAULT_STORAGE_TIMEOUT).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert!(!gateway.is_connected());
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hung_connect_times_out_as_unavailable() {
        let store = FakeStore { hang_connect: true, ..Default::default() };
        let gateway = PersistenceGateway::new(store, "hots");

        let err = gateway
            .connect("mongodb://x", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
