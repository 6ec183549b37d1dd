//! Document store boundary.
//!
//! All durable persistence is delegated to a hosted document store. The
//! [`DocumentStore`] trait covers the slice of its API this crate uses:
//! CRUD keyed by (collection, document id/filters) plus a realtime feed of
//! document change events. [`HostedStore`] talks to the real backend;
//! [`MemoryStore`] backs tests and local development.

pub mod hosted;
pub mod memory;
pub mod realtime;

pub use hosted::HostedStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use tokio::sync::broadcast;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A create collided with an existing id, or an update guard failed.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// A stored document: an id plus its JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Deserialize the payload into a typed model.
    pub fn to<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// A list filter, matching the hosted backend's query dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Query {
    Equal { field: String, value: Value },
    NotEqual { field: String, value: Value },
}

impl Query {
    pub fn equal(field: &str, value: impl Into<Value>) -> Self {
        Query::Equal {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn not_equal(field: &str, value: impl Into<Value>) -> Self {
        Query::NotEqual {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Whether a document payload satisfies this filter.
    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Query::Equal { field, value } => data.get(field) == Some(value),
            Query::NotEqual { field, value } => data.get(field) != Some(value),
        }
    }
}

/// Conditional-update guard, enforced by the store itself so concurrent
/// writers lose with a conflict instead of racing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UpdateGuard {
    /// Unconditional update.
    None,
    /// The field must currently be null (or absent).
    FieldIsNull { field: String },
    /// The field must currently equal the given value.
    FieldEquals { field: String, value: Value },
}

impl UpdateGuard {
    pub fn field_is_null(field: &str) -> Self {
        UpdateGuard::FieldIsNull {
            field: field.to_string(),
        }
    }

    pub fn field_equals(field: &str, value: impl Into<Value>) -> Self {
        UpdateGuard::FieldEquals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Check the guard against a document's current payload.
    pub fn check(&self, data: &Value) -> Result<(), StoreError> {
        match self {
            UpdateGuard::None => Ok(()),
            UpdateGuard::FieldIsNull { field } => match data.get(field) {
                None | Some(Value::Null) => Ok(()),
                Some(_) => Err(StoreError::Conflict(format!(
                    "field '{}' is already set",
                    field
                ))),
            },
            UpdateGuard::FieldEquals { field, value } => {
                if data.get(field) == Some(value) {
                    Ok(())
                } else {
                    Err(StoreError::Conflict(format!(
                        "field '{}' does not match expected value",
                        field
                    )))
                }
            }
        }
    }
}

/// Kind of document change carried on the realtime feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
}

/// A document change event from the realtime feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEvent {
    pub collection: String,
    pub kind: EventKind,
    pub document: Document,
}

/// The document-store collaborator.
///
/// `update` merges the patch object into the stored payload after the
/// guard passes. `subscribe` returns a broadcast receiver of change events
/// for one collection; lagged receivers drop old events rather than
/// blocking writers.
pub trait DocumentStore: Send + Sync + 'static {
    fn list(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    fn create(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        guard: UpdateGuard,
    ) -> impl Future<Output = Result<Document, StoreError>> + Send;

    fn subscribe(&self, collection: &str) -> broadcast::Receiver<DocumentEvent>;
}
