// Document CRUD over SQLite.
//
// Store semantics: assign-id insert, replace-by-id update, idempotent delete,
// and a settings key/value table. Every committed write publishes a fresh
// collection snapshot to the subscription hub. There are no multi-document
// transactions; each document write is atomic on its own.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::{Result, ShopTrackError};

use super::subscription::{Subscription, SubscriptionHub};

/// One stored document: id plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: serde_json::Value,
    pub created_at: String,
    pub updated_at: String,
}

/// Handle to a store on disk. Cheap to clone; connections are opened
/// per-operation from the stored root path.
#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
    hub: Arc<SubscriptionHub>,
}

impl DocumentStore {
    /// Open (creating if needed) the store under `<root>/.shoptrack/`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        super::init_store(&root)?;
        Ok(Self {
            root,
            hub: Arc::new(SubscriptionHub::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn connect(&self) -> Result<Connection> {
        Ok(super::open_store_connection(&self.root)?)
    }

    /// Insert a document, assigning a new id. Returns the id.
    pub fn insert(&self, collection: &str, body: &serde_json::Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
            params![collection, id, body.to_string()],
        )?;
        drop(conn);

        self.publish(collection);
        Ok(id)
    }

    /// Replace the full body of an existing document.
    pub fn replace(&self, collection: &str, id: &str, body: &serde_json::Value) -> Result<()> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE documents SET body = ?3, updated_at = datetime('now')
             WHERE collection = ?1 AND id = ?2",
            params![collection, id, body.to_string()],
        )?;
        drop(conn);

        if changed == 0 {
            return Err(ShopTrackError::RecordNotFound(id.to_string()));
        }

        self.publish(collection);
        Ok(())
    }

    /// Delete a document. Deleting a nonexistent id is not an error.
    pub fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        drop(conn);

        if changed > 0 {
            self.publish(collection);
        }
        Ok(())
    }

    pub fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let conn = self.connect()?;
        get_document(&conn, collection, id)
    }

    /// All documents in a collection, in stable insertion order.
    pub fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let conn = self.connect()?;
        list_documents(&conn, collection)
    }

    /// Live subscription to the whole collection. The current snapshot is
    /// delivered immediately.
    pub fn subscribe_collection(&self, collection: &str) -> Result<Subscription<Vec<Document>>> {
        let initial = self.list(collection)?;
        Ok(self.hub.subscribe_collection(collection, initial))
    }

    /// Live subscription to one document. The current state (possibly absent)
    /// is delivered immediately.
    pub fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Subscription<Option<Document>>> {
        let initial = self.get(collection, id)?;
        Ok(self.hub.subscribe_document(collection, id, initial))
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connect()?;
        get_setting(&conn, key)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connect()?;
        set_setting(&conn, key, value)
    }

    /// Read the current collection state and fan it out to subscribers.
    /// Failures here must not fail the write that triggered them.
    fn publish(&self, collection: &str) {
        match self.list(collection) {
            Ok(snapshot) => self.hub.publish(collection, &snapshot),
            Err(e) => log::error!("Snapshot publish for '{}' failed: {}", collection, e),
        }
    }
}

fn get_document(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>> {
    let row = conn
        .query_row(
            "SELECT id, body, created_at, updated_at FROM documents
             WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            document_from_row,
        )
        .optional()?;

    match row {
        Some((id, body, created_at, updated_at)) => Ok(Some(Document {
            id,
            body: serde_json::from_str(&body)?,
            created_at,
            updated_at,
        })),
        None => Ok(None),
    }
}

fn list_documents(conn: &Connection, collection: &str) -> Result<Vec<Document>> {
    let mut stmt = conn.prepare(
        "SELECT id, body, created_at, updated_at FROM documents
         WHERE collection = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(params![collection], document_from_row)?;

    let mut documents = Vec::new();
    for row in rows {
        let (id, body, created_at, updated_at) = row?;
        documents.push(Document {
            id,
            body: serde_json::from_str(&body)?,
            created_at,
            updated_at,
        });
    }
    Ok(documents)
}

type DocumentRow = (String, String, String, String);

fn document_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, DocumentStore) {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::open(tmp.path()).unwrap();
        (tmp, store)
    }

    #[test]
    fn insert_assigns_distinct_ids_and_roundtrips_body() {
        let (_tmp, store) = open_store();

        let a = store
            .insert("vehicles", &serde_json::json!({ "plate": "AAA111" }))
            .unwrap();
        let b = store
            .insert("vehicles", &serde_json::json!({ "plate": "BBB222" }))
            .unwrap();
        assert_ne!(a, b);

        let doc = store.get("vehicles", &a).unwrap().unwrap();
        assert_eq!(doc.body["plate"], "AAA111");
    }

    #[test]
    fn replace_overwrites_whole_body_and_requires_existing_id() {
        let (_tmp, store) = open_store();

        let id = store
            .insert("vehicles", &serde_json::json!({ "plate": "AAA111", "brand": "Kia" }))
            .unwrap();
        store
            .replace("vehicles", &id, &serde_json::json!({ "plate": "CCC333" }))
            .unwrap();

        let doc = store.get("vehicles", &id).unwrap().unwrap();
        assert_eq!(doc.body["plate"], "CCC333");
        // Full replace, not merge
        assert!(doc.body.get("brand").is_none());

        let missing = store.replace("vehicles", "nope", &serde_json::json!({}));
        assert!(matches!(missing, Err(ShopTrackError::RecordNotFound(_))));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_tmp, store) = open_store();

        let id = store
            .insert("vehicles", &serde_json::json!({ "plate": "AAA111" }))
            .unwrap();
        store.delete("vehicles", &id).unwrap();
        assert!(store.get("vehicles", &id).unwrap().is_none());

        // Second delete of the same id succeeds silently
        store.delete("vehicles", &id).unwrap();
        store.delete("vehicles", "never-existed").unwrap();
    }

    #[test]
    fn writes_push_snapshots_to_collection_subscribers() {
        let (_tmp, store) = open_store();
        let sub = store.subscribe_collection("vehicles").unwrap();

        // Initial (empty) snapshot arrives on subscribe
        assert_eq!(sub.try_recv().unwrap().len(), 0);

        let id = store
            .insert("vehicles", &serde_json::json!({ "plate": "AAA111" }))
            .unwrap();
        assert_eq!(sub.try_recv().unwrap().len(), 1);

        store.delete("vehicles", &id).unwrap();
        assert_eq!(sub.try_recv().unwrap().len(), 0);

        // Deleting an absent id publishes nothing new
        store.delete("vehicles", &id).unwrap();
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn settings_upsert_and_read_back() {
        let (_tmp, store) = open_store();

        assert_eq!(store.get_setting("list_page_size").unwrap(), None);
        store.set_setting("list_page_size", "4").unwrap();
        store.set_setting("list_page_size", "6").unwrap();
        assert_eq!(
            store.get_setting("list_page_size").unwrap(),
            Some("6".to_string())
        );
    }
}
