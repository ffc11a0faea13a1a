// Live subscription plumbing for the document store.
//
// Subscribers register a channel in a shared registry and receive a full
// snapshot on registration and after every committed write. Delivery order
// relative to local writes is eventual, not strict. Dead receivers are pruned
// on the next publish; cancelling (or dropping) a subscription removes it.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use super::documents::Document;

/// Full point-in-time copy of a collection's documents.
pub type CollectionSnapshot = Vec<Document>;

struct CollectionSub {
    collection: String,
    sender: Sender<CollectionSnapshot>,
}

struct DocumentSub {
    collection: String,
    id: String,
    sender: Sender<Option<Document>>,
}

/// Registry of live subscribers, keyed by subscription token.
#[derive(Default)]
pub struct SubscriptionHub {
    collection_subs: Mutex<HashMap<String, CollectionSub>>,
    document_subs: Mutex<HashMap<String, DocumentSub>>,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a whole-collection subscriber. The initial snapshot is
    /// delivered immediately.
    pub fn subscribe_collection(
        self: &Arc<Self>,
        collection: &str,
        initial: CollectionSnapshot,
    ) -> Subscription<CollectionSnapshot> {
        let token = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::channel();
        let _ = sender.send(initial);

        let mut subs = self.collection_subs.lock().unwrap();
        subs.insert(
            token.clone(),
            CollectionSub {
                collection: collection.to_string(),
                sender,
            },
        );

        Subscription {
            token,
            receiver,
            hub: Arc::clone(self),
        }
    }

    /// Register a single-document subscriber. The initial state (which may be
    /// absent) is delivered immediately.
    pub fn subscribe_document(
        self: &Arc<Self>,
        collection: &str,
        id: &str,
        initial: Option<Document>,
    ) -> Subscription<Option<Document>> {
        let token = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::channel();
        let _ = sender.send(initial);

        let mut subs = self.document_subs.lock().unwrap();
        subs.insert(
            token.clone(),
            DocumentSub {
                collection: collection.to_string(),
                id: id.to_string(),
                sender,
            },
        );

        Subscription {
            token,
            receiver,
            hub: Arc::clone(self),
        }
    }

    /// Push a fresh snapshot of one collection to every matching subscriber.
    pub fn publish(&self, collection: &str, snapshot: &CollectionSnapshot) {
        {
            let mut subs = self.collection_subs.lock().unwrap();
            subs.retain(|_, sub| {
                if sub.collection != collection {
                    return true;
                }
                sub.sender.send(snapshot.clone()).is_ok()
            });
        }

        let mut subs = self.document_subs.lock().unwrap();
        subs.retain(|_, sub| {
            if sub.collection != collection {
                return true;
            }
            let doc = snapshot.iter().find(|d| d.id == sub.id).cloned();
            sub.sender.send(doc).is_ok()
        });
    }

    fn cancel(&self, token: &str) {
        self.collection_subs.lock().unwrap().remove(token);
        self.document_subs.lock().unwrap().remove(token);
    }
}

/// A live, cancellable subscription handle. Dropping it cancels delivery.
pub struct Subscription<T> {
    token: String,
    receiver: Receiver<T>,
    hub: Arc<SubscriptionHub>,
}

impl<T> Subscription<T> {
    /// Next pending snapshot, if one is queued.
    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Block up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Drain everything queued and return only the most recent snapshot.
    pub fn latest(&self) -> Option<T> {
        let mut latest = None;
        while let Ok(snapshot) = self.receiver.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }

    /// Stop receiving updates. Equivalent to dropping the handle.
    pub fn cancel(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.hub.cancel(&self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> Document {
        Document {
            id: id.to_string(),
            body: serde_json::json!({ "plate": id }),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn subscriber_receives_initial_then_published_snapshots() {
        let hub = Arc::new(SubscriptionHub::new());
        let sub = hub.subscribe_collection("vehicles", vec![doc("a")]);

        let initial = sub.try_recv().unwrap();
        assert_eq!(initial.len(), 1);

        hub.publish("vehicles", &vec![doc("a"), doc("b")]);
        let next = sub.try_recv().unwrap();
        assert_eq!(next.len(), 2);

        // Publishes for other collections are not delivered
        hub.publish("invoices", &vec![doc("x")]);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn cancel_stops_delivery_and_removes_registration() {
        let hub = Arc::new(SubscriptionHub::new());
        let sub = hub.subscribe_collection("vehicles", Vec::new());
        let _ = sub.try_recv();

        sub.cancel();
        assert!(hub.collection_subs.lock().unwrap().is_empty());

        // Publishing after cancel must not panic
        hub.publish("vehicles", &vec![doc("a")]);
    }

    #[test]
    fn document_subscriber_sees_only_its_record() {
        let hub = Arc::new(SubscriptionHub::new());
        let sub = hub.subscribe_document("vehicles", "b", None);
        assert_eq!(sub.try_recv(), Some(None));

        hub.publish("vehicles", &vec![doc("a"), doc("b")]);
        let delivered = sub.try_recv().unwrap();
        assert_eq!(delivered.unwrap().id, "b");

        // Deleted from the snapshot: subscriber is told it is gone
        hub.publish("vehicles", &vec![doc("a")]);
        assert_eq!(sub.try_recv(), Some(None));
    }

    #[test]
    fn latest_drains_queued_snapshots() {
        let hub = Arc::new(SubscriptionHub::new());
        let sub = hub.subscribe_collection("vehicles", Vec::new());

        hub.publish("vehicles", &vec![doc("a")]);
        hub.publish("vehicles", &vec![doc("a"), doc("b")]);

        let latest = sub.latest().unwrap();
        assert_eq!(latest.len(), 2);
        assert!(sub.try_recv().is_none());
    }
}
