//! Async access to one collection of the document store.

use std::sync::Arc;

use neolight_core::DatabaseError;
use parking_lot::Mutex;

use crate::document_store::{Document, SqliteDocumentStore};

/// Cloneable handle to a single collection.
///
/// SQLite work runs on the blocking pool; the mutex serializes every access
/// to the shared connection.
#[derive(Clone)]
pub struct DocumentClient {
    store: Arc<Mutex<SqliteDocumentStore>>,
    collection: Arc<str>,
}

impl DocumentClient {
    pub fn new(store: SqliteDocumentStore, collection: &str) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            collection: Arc::from(collection),
        }
    }

    pub async fn find_one(&self, name: &str) -> Result<Option<Document>, DatabaseError> {
        let store = self.store.clone();
        let collection = self.collection.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || store.lock().find_one(&collection, &name))
            .await
            .map_err(join_error)?
    }

    /// `$set` upsert; see [`SqliteDocumentStore::set_fields`].
    pub async fn set_fields(&self, name: &str, fields: Document) -> Result<Document, DatabaseError> {
        let store = self.store.clone();
        let collection = self.collection.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || store.lock().set_fields(&collection, &name, fields))
            .await
            .map_err(join_error)?
    }

    pub async fn count(&self) -> Result<usize, DatabaseError> {
        let store = self.store.clone();
        let collection = self.collection.clone();
        tokio::task::spawn_blocking(move || store.lock().count(&collection))
            .await
            .map_err(join_error)?
    }
}

fn join_error(e: tokio::task::JoinError) -> DatabaseError {
    DatabaseError::QueryFailed(format!("store task failed: {}", e))
}
