//! MongoDB-backed document store

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};

use crate::application::errors::StorageError;
use crate::domain::traits::DocumentStore;

/// A connected client plus the database it is scoped to
#[derive(Clone, Debug)]
pub struct MongoHandle {
    client: Client,
    database: Database,
}

/// MongoDB driver adapter
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoStore;

impl MongoStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    type Handle = MongoHandle;
    type Collection = Collection<Document>;

    async fn connect(&self, uri: &str, database: &str) -> Result<MongoHandle, StorageError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let database = client.database(database);
        Ok(MongoHandle { client, database })
    }

    async fn ping(&self, handle: &MongoHandle) -> Result<(), StorageError> {
        handle
            .database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn disconnect(&self, handle: MongoHandle) -> Result<(), StorageError> {
        handle.client.shutdown().await;
        Ok(())
    }

    fn collection(&self, handle: &MongoHandle, name: &str) -> Collection<Document> {
        handle.database.collection::<Document>(name)
    }
}
