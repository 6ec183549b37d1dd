//! HTTP client for the hosted document store.

use super::realtime::RealtimeChannel;
use super::{Document, DocumentEvent, DocumentStore, Query, StoreError, UpdateGuard};
use crate::config::BackendConfig;
use crate::error::AppError;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Capacity of each collection's realtime event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// One page of documents from a list call.
#[derive(Debug, Deserialize)]
struct DocumentsPage {
    #[allow(dead_code)]
    total: u64,
    documents: Vec<Document>,
}

/// [`DocumentStore`] backed by the hosted backend's REST API, with the
/// realtime feed carried over a WebSocket channel per collection.
pub struct HostedStore {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: Option<String>,
    database_id: String,
    realtime_url: String,
    /// Realtime channels keyed by collection; the reader task for a
    /// collection is spawned on first subscribe.
    channels: DashMap<String, broadcast::Sender<DocumentEvent>>,
}

impl HostedStore {
    /// Create a store from backend configuration.
    ///
    /// Fails immediately when no database id is configured, before any
    /// network call is made.
    pub fn new(config: &BackendConfig) -> crate::error::Result<Self> {
        let database_id = config
            .database_id
            .clone()
            .ok_or_else(|| AppError::Config("BACKEND_DATABASE_ID is not configured".to_string()))?;

        info!(
            "Hosted store: {} (database {})",
            config.endpoint, database_id
        );

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            database_id,
            realtime_url: config.realtime_endpoint(),
            channels: DashMap::new(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.documents_url(collection), id)
    }

    /// The realtime channel name for a collection's document events.
    fn channel_name(&self, collection: &str) -> String {
        format!(
            "databases.{}.collections.{}.documents",
            self.database_id, collection
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, url)
            .header("X-Project-Id", &self.project_id);
        if let Some(ref key) = self.api_key {
            builder = builder.header("X-Api-Key", key);
        }
        builder
    }

    async fn parse<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        collection: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response.text().await.unwrap_or_default();
        match status.as_u16() {
            404 => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
            409 => Err(StoreError::Conflict(message)),
            code => Err(StoreError::Backend {
                status: code,
                message,
            }),
        }
    }
}

impl DocumentStore for HostedStore {
    async fn list(&self, collection: &str, queries: &[Query]) -> Result<Vec<Document>, StoreError> {
        let mut request = self.request(reqwest::Method::GET, &self.documents_url(collection));
        if !queries.is_empty() {
            request = request.query(&[("queries", serde_json::to_string(queries)?)]);
        }

        let response = request.send().await?;
        let page: DocumentsPage = self.parse(response, collection, "").await?;
        debug!("Listed {} documents from '{}'", page.documents.len(), collection);
        Ok(page.documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &self.document_url(collection, id))
            .send()
            .await?;
        self.parse(response, collection, id).await
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> Result<Document, StoreError> {
        let response = self
            .request(reqwest::Method::POST, &self.documents_url(collection))
            .json(&json!({ "documentId": id, "data": data }))
            .send()
            .await?;
        self.parse(response, collection, id).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Value,
        guard: UpdateGuard,
    ) -> Result<Document, StoreError> {
        let response = self
            .request(reqwest::Method::PATCH, &self.document_url(collection, id))
            .json(&json!({ "data": patch, "guard": guard }))
            .send()
            .await?;
        self.parse(response, collection, id).await
    }

    fn subscribe(&self, collection: &str) -> broadcast::Receiver<DocumentEvent> {
        let sender = self
            .channels
            .entry(collection.to_string())
            .or_insert_with(|| {
                let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
                RealtimeChannel::spawn(
                    format!("{}?project={}", self.realtime_url, self.project_id),
                    self.channel_name(collection),
                    collection.to_string(),
                    tx.clone(),
                );
                tx
            })
            .clone();
        sender.subscribe()
    }
}
