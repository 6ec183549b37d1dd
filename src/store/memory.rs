//! In-memory document store for tests and local development.

use super::{Document, DocumentEvent, DocumentStore, EventKind, Query, StoreError, UpdateGuard};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;

/// Capacity of each collection's event channel. Lagged subscribers drop
/// old events rather than blocking writers.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// DashMap-backed [`DocumentStore`]. Enforces the same create-collision
/// and update-guard semantics as the hosted backend, and broadcasts
/// change events per collection.
#[derive(Default)]
pub struct MemoryStore {
    /// Documents keyed by collection, then document id.
    collections: DashMap<String, DashMap<String, Value>>,
    /// Event channels keyed by collection.
    channels: DashMap<String, broadcast::Sender<DocumentEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, collection: &str) -> broadcast::Sender<DocumentEvent> {
        self.channels
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_CHANNEL_CAPACITY).0)
            .clone()
    }

    fn emit(&self, collection: &str, kind: EventKind, document: Document) {
        if let Some(tx) = self.channels.get(collection) {
            // No receivers is fine
            let _ = tx.send(DocumentEvent {
                collection: collection.to_string(),
                kind,
                document,
            });
        }
    }

    /// Number of documents in a collection. Test helper.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str, queries: &[Query]) -> Result<Vec<Document>, StoreError> {
        let docs = match self.collections.get(collection) {
            Some(docs) => docs,
            None => return Ok(Vec::new()),
        };

        Ok(docs
            .iter()
            .filter(|entry| queries.iter().all(|q| q.matches(entry.value())))
            .map(|entry| Document {
                id: entry.key().clone(),
                data: entry.value().clone(),
            })
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        self.collections
            .get(collection)
            .and_then(|docs| {
                docs.get(id).map(|data| Document {
                    id: id.to_string(),
                    data: data.clone(),
                })
            })
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> Result<Document, StoreError> {
        let docs = self
            .collections
            .entry(collection.to_string())
            .or_default();

        if docs.contains_key(id) {
            return Err(StoreError::Conflict(format!(
                "document '{}' already exists in '{}'",
                id, collection
            )));
        }
        docs.insert(id.to_string(), data.clone());
        drop(docs);

        let document = Document {
            id: id.to_string(),
            data,
        };
        self.emit(collection, EventKind::Created, document.clone());
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        guard: UpdateGuard,
    ) -> Result<Document, StoreError> {
        let docs = self
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let mut entry = docs.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })?;

        guard.check(entry.value())?;

        if let (Value::Object(current), Value::Object(fields)) = (entry.value_mut(), patch) {
            for (key, value) in fields {
                current.insert(key, value);
            }
        } else {
            return Err(StoreError::Conflict(
                "update patch must be a JSON object".to_string(),
            ));
        }

        let document = Document {
            id: id.to_string(),
            data: entry.value().clone(),
        };
        drop(entry);
        drop(docs);

        self.emit(collection, EventKind::Updated, document.clone());
        Ok(document)
    }

    fn subscribe(&self, collection: &str) -> broadcast::Receiver<DocumentEvent> {
        self.sender(collection).subscribe()
    }
}
