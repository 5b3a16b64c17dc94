//! SQLite-backed document collections.
//!
//! Each document is a JSON object keyed by `(collection, name)`. Writes use
//! `$set` semantics: only the supplied fields change, everything else already
//! in the document is kept.

use chrono::Utc;
use neolight_core::{DatabaseError, RusqliteErrorExt};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// A stored document: a JSON object that always carries a `name` field.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Field every document is keyed by
pub const NAME_FIELD: &str = "name";

/// SQLite document storage.
pub struct SqliteDocumentStore {
    conn: Connection,
}

impl SqliteDocumentStore {
    /// Open (or create) a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::ConnectionFailed(format!("{}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path).map_err(RusqliteErrorExt::into_database_error)?;
        let store = Self { conn };
        store.init_schema()?;
        tracing::info!("Opened document store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(RusqliteErrorExt::into_database_error)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS documents (
                    collection TEXT NOT NULL,
                    name TEXT NOT NULL,
                    body TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (collection, name)
                );
                "#,
            )
            .map_err(RusqliteErrorExt::into_database_error)
    }

    /// Find the document with the given name.
    pub fn find_one(&self, collection: &str, name: &str) -> Result<Option<Document>, DatabaseError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND name = ?2",
                params![collection, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(RusqliteErrorExt::into_database_error)?;

        body.map(|b| parse_body(name, &b)).transpose()
    }

    /// Set `fields` on the named document, creating it if absent.
    ///
    /// Runs in one transaction, so readers see either the old or the new
    /// document. A `name` entry in `fields` is ignored. Returns the document
    /// as stored.
    pub fn set_fields(
        &mut self,
        collection: &str,
        name: &str,
        fields: Document,
    ) -> Result<Document, DatabaseError> {
        let tx = self
            .conn
            .transaction()
            .map_err(RusqliteErrorExt::into_database_error)?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND name = ?2",
                params![collection, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(RusqliteErrorExt::into_database_error)?;

        let mut document = match existing {
            Some(body) => parse_body(name, &body)?,
            None => Document::new(),
        };

        for (key, value) in fields {
            if key != NAME_FIELD {
                document.insert(key, value);
            }
        }
        document.insert(NAME_FIELD.to_string(), serde_json::Value::String(name.to_string()));

        let body = serde_json::to_string(&document)
            .map_err(|e| DatabaseError::InvalidDocument(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            "INSERT INTO documents (collection, name, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(collection, name) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at",
            params![collection, name, body, now],
        )
        .map_err(RusqliteErrorExt::into_database_error)?;

        tx.commit().map_err(RusqliteErrorExt::into_database_error)?;
        Ok(document)
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(RusqliteErrorExt::into_database_error)?;
        Ok(count as usize)
    }
}

fn parse_body(name: &str, body: &str) -> Result<Document, DatabaseError> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err(DatabaseError::Corruption(format!(
            "document '{}' is not a JSON object",
            name
        ))),
        Err(e) => Err(DatabaseError::Corruption(format!("document '{}': {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_find_missing_document() {
        let store = SqliteDocumentStore::in_memory().unwrap();
        assert!(store.find_one("data", "neo").unwrap().is_none());
        assert_eq!(store.count("data").unwrap(), 0);
    }

    #[test]
    fn test_set_fields_creates_document() {
        let mut store = SqliteDocumentStore::in_memory().unwrap();
        let doc = store
            .set_fields("data", "neo", fields(json!({"weather": "clear"})))
            .unwrap();

        assert_eq!(doc["name"], "neo");
        assert_eq!(doc["weather"], "clear");
        assert_eq!(store.find_one("data", "neo").unwrap(), Some(doc));
        assert_eq!(store.count("data").unwrap(), 1);
    }

    #[test]
    fn test_set_fields_preserves_other_fields() {
        let mut store = SqliteDocumentStore::in_memory().unwrap();
        store
            .set_fields("data", "neo", fields(json!({"currentMode": "auto", "weather": "rain"})))
            .unwrap();
        store
            .set_fields("data", "neo", fields(json!({"weather": "clear"})))
            .unwrap();

        let doc = store.find_one("data", "neo").unwrap().unwrap();
        assert_eq!(doc["currentMode"], "auto");
        assert_eq!(doc["weather"], "clear");
        assert_eq!(store.count("data").unwrap(), 1);
    }

    #[test]
    fn test_set_fields_is_idempotent() {
        let mut store = SqliteDocumentStore::in_memory().unwrap();
        let input = fields(json!({"weather": "haze", "sunrise": "06:01:02"}));

        let first = store.set_fields("data", "neo", input.clone()).unwrap();
        let second = store.set_fields("data", "neo", input).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count("data").unwrap(), 1);
    }

    #[test]
    fn test_name_field_cannot_be_overwritten() {
        let mut store = SqliteDocumentStore::in_memory().unwrap();
        let doc = store
            .set_fields("data", "neo", fields(json!({"name": "impostor", "weather": "clear"})))
            .unwrap();
        assert_eq!(doc["name"], "neo");
        assert!(store.find_one("data", "impostor").unwrap().is_none());
    }

    #[test]
    fn test_collections_are_separate() {
        let mut store = SqliteDocumentStore::in_memory().unwrap();
        store.set_fields("data", "neo", Document::new()).unwrap();
        store.set_fields("archive", "neo", Document::new()).unwrap();
        store.set_fields("data", "trinity", Document::new()).unwrap();

        assert_eq!(store.count("data").unwrap(), 2);
        assert_eq!(store.count("archive").unwrap(), 1);
    }

    #[test]
    fn test_corrupt_body_is_reported() {
        let mut store = SqliteDocumentStore::in_memory().unwrap();
        store.set_fields("data", "neo", Document::new()).unwrap();
        store
            .conn
            .execute("UPDATE documents SET body = '[1, 2]' WHERE name = 'neo'", [])
            .unwrap();

        let err = store.find_one("data", "neo").unwrap_err();
        assert!(matches!(err, DatabaseError::Corruption(_)));
    }

    #[test]
    fn test_open_creates_file_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("neolight.db");

        {
            let mut store = SqliteDocumentStore::open(&path).unwrap();
            store
                .set_fields("data", "neo", fields(json!({"weather": "snow"})))
                .unwrap();
        }

        let store = SqliteDocumentStore::open(&path).unwrap();
        let doc = store.find_one("data", "neo").unwrap().unwrap();
        assert_eq!(doc["weather"], "snow");
    }
}
