use async_trait::async_trait;

use crate::application::errors::StorageError;

/// Document store driver - abstraction over the database client.
///
/// The driver is stateless; whoever calls `connect` owns the returned
/// handle and decides when to release it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    type Handle: Clone + Send + Sync + 'static;
    type Collection: Send + Sync;

    /// Create a client for `uri` scoped to `database`
    async fn connect(&self, uri: &str, database: &str) -> Result<Self::Handle, StorageError>;

    /// Round-trip to the server to prove the connection works
    async fn ping(&self, handle: &Self::Handle) -> Result<(), StorageError>;

    /// Release the connection
    async fn disconnect(&self, handle: Self::Handle) -> Result<(), StorageError>;

    /// Named collection within the handle's database
    fn collection(&self, handle: &Self::Handle, name: &str) -> Self::Collection;
}
