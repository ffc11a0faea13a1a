// Vehicle record repository: typed CRUD and live snapshots over the
// document store, keyed by record id.

use std::time::Duration;

use crate::constants::VEHICLES_COLLECTION;
use crate::error::{Result, ShopTrackError};
use crate::model::VehicleRecord;
use crate::store::documents::{Document, DocumentStore};
use crate::store::subscription::Subscription;

#[derive(Clone)]
pub struct RecordRepository {
    store: DocumentStore,
}

impl RecordRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Persist a new record. The store assigns the id; the record's own `id`
    /// field is ignored. Returns the assigned id.
    pub fn insert(&self, record: &VehicleRecord) -> Result<String> {
        let body = encode(record)?;
        self.store
            .insert(VEHICLES_COLLECTION, &body)
            .map_err(|e| ShopTrackError::Persist(e.to_string()))
    }

    /// Replace the full contents of an existing record.
    pub fn update(&self, id: &str, record: &VehicleRecord) -> Result<()> {
        let body = encode(record)?;
        self.store
            .replace(VEHICLES_COLLECTION, id, &body)
            .map_err(|e| match e {
                ShopTrackError::RecordNotFound(_) => e,
                other => ShopTrackError::Persist(other.to_string()),
            })
    }

    /// Delete a record. Deleting a nonexistent id is not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(VEHICLES_COLLECTION, id)
    }

    pub fn get(&self, id: &str) -> Result<Option<VehicleRecord>> {
        let doc = self.store.get(VEHICLES_COLLECTION, id)?;
        Ok(doc.as_ref().map(decode))
    }

    /// One-shot read of the whole collection.
    pub fn list_all(&self) -> Result<Vec<VehicleRecord>> {
        let docs = self.store.list(VEHICLES_COLLECTION)?;
        Ok(docs.iter().map(decode).collect())
    }

    /// Live subscription to the whole collection. The current snapshot is
    /// delivered immediately; every later write pushes a fresh one.
    pub fn subscribe_all(&self) -> Result<RecordSubscription> {
        let inner = self.store.subscribe_collection(VEHICLES_COLLECTION)?;
        Ok(RecordSubscription { inner })
    }

    /// Live subscription to one record (absent once deleted).
    pub fn subscribe(&self, id: &str) -> Result<SingleRecordSubscription> {
        let inner = self.store.subscribe_document(VEHICLES_COLLECTION, id)?;
        Ok(SingleRecordSubscription { inner })
    }
}

/// Serialize for storage. The id lives in the document key, never the body.
fn encode(record: &VehicleRecord) -> Result<serde_json::Value> {
    let mut body = record.clone();
    body.id = None;
    Ok(serde_json::to_value(&body)?)
}

/// Decode a stored document, stamping the store-assigned id back on. A body
/// that no longer parses yields a placeholder record rather than poisoning
/// the whole snapshot.
fn decode(doc: &Document) -> VehicleRecord {
    match serde_json::from_value::<VehicleRecord>(doc.body.clone()) {
        Ok(mut record) => {
            record.id = Some(doc.id.clone());
            record
        }
        Err(e) => {
            log::warn!("Skipping malformed vehicle document {}: {}", doc.id, e);
            VehicleRecord {
                id: Some(doc.id.clone()),
                ..Default::default()
            }
        }
    }
}

/// Cancellable live view of the whole vehicle collection.
pub struct RecordSubscription {
    inner: Subscription<Vec<Document>>,
}

impl RecordSubscription {
    pub fn try_recv(&self) -> Option<Vec<VehicleRecord>> {
        self.inner.try_recv().map(|docs| decode_all(&docs))
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Vec<VehicleRecord>> {
        self.inner.recv_timeout(timeout).map(|docs| decode_all(&docs))
    }

    /// Drain queued snapshots, returning only the most recent.
    pub fn latest(&self) -> Option<Vec<VehicleRecord>> {
        self.inner.latest().map(|docs| decode_all(&docs))
    }

    pub fn cancel(self) {
        self.inner.cancel();
    }
}

/// Cancellable live view of a single vehicle record.
pub struct SingleRecordSubscription {
    inner: Subscription<Option<Document>>,
}

impl SingleRecordSubscription {
    pub fn try_recv(&self) -> Option<Option<VehicleRecord>> {
        self.inner.try_recv().map(|doc| doc.as_ref().map(decode))
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Option<VehicleRecord>> {
        self.inner
            .recv_timeout(timeout)
            .map(|doc| doc.as_ref().map(decode))
    }

    pub fn cancel(self) {
        self.inner.cancel();
    }
}

fn decode_all(docs: &[Document]) -> Vec<VehicleRecord> {
    docs.iter().map(decode).collect()
}
