//! Stock Service
//!
//! Reads and writes the stocks collection: price updates (two-decimal
//! formatting, lastUpdated stamping), realtime price subscriptions, and
//! idempotent seeding of the default stock set.

use crate::error::Result;
use crate::store::{DocumentEvent, DocumentStore, UpdateGuard};
use crate::types::{PriceUpdate, Stock};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Stocks available to every new deployment.
pub const DEFAULT_STOCKS: &[(&str, &str, f64)] = &[
    ("AAPL", "Apple Inc.", 150.00),
    ("GOOGL", "Alphabet Inc.", 2800.00),
    ("MSFT", "Microsoft Corp.", 300.00),
    ("AMZN", "Amazon.com Inc.", 3300.00),
    ("TSLA", "Tesla Inc.", 900.00),
];

/// Service for the stocks collection.
pub struct StockService<S> {
    store: Arc<S>,
    collection: String,
}

impl<S: DocumentStore> StockService<S> {
    pub fn new(store: Arc<S>, collection: String) -> Self {
        Self { store, collection }
    }

    /// All known stocks.
    pub async fn list(&self) -> Result<Vec<Stock>> {
        let docs = self.store.list(&self.collection, &[]).await?;
        let stocks = docs
            .iter()
            .map(|doc| doc.to::<Stock>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stocks)
    }

    /// A single stock by symbol.
    pub async fn get(&self, symbol: &str) -> Result<Stock> {
        let doc = self
            .store
            .get(&self.collection, &symbol.to_uppercase())
            .await?;
        Ok(doc.to()?)
    }

    /// The current price of a stock.
    pub async fn current_price(&self, symbol: &str) -> Result<f64> {
        Ok(self.get(symbol).await?.current_price)
    }

    /// Persist a new price for a stock, keeping two decimal places and
    /// stamping the update time.
    pub async fn update_price(&self, symbol: &str, new_price: f64) -> Result<()> {
        let formatted = (new_price * 100.0).round() / 100.0;
        let patch = json!({
            "currentPrice": formatted,
            "lastUpdated": Utc::now(),
        });

        match self
            .store
            .update(
                &self.collection,
                &symbol.to_uppercase(),
                patch,
                UpdateGuard::None,
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Error updating stock price for {}: {}", symbol, e);
                Err(e.into())
            }
        }
    }

    /// Subscribe to raw change events on the stocks collection.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DocumentEvent> {
        self.store.subscribe(&self.collection)
    }

    /// Interpret a stocks-collection event as a price update, when the
    /// payload parses as a stock.
    pub fn price_update_from_event(event: &DocumentEvent) -> Option<PriceUpdate> {
        let stock: Stock = event.document.to().ok()?;
        Some(PriceUpdate {
            symbol: stock.symbol,
            price: stock.current_price,
            timestamp: stock.last_updated.timestamp_millis(),
        })
    }

    /// Create the default stocks when the collection is empty. Called at
    /// startup; a no-op on every later run.
    pub async fn seed_defaults(&self) -> Result<Vec<Stock>> {
        if !self.list().await?.is_empty() {
            return Ok(Vec::new());
        }

        let mut seeded = Vec::with_capacity(DEFAULT_STOCKS.len());
        for &(symbol, name, price) in DEFAULT_STOCKS {
            let stock = Stock::new(symbol, name, price);
            self.store
                .create(&self.collection, &stock.symbol, serde_json::to_value(&stock)?)
                .await?;
            seeded.push(stock);
        }

        info!("Seeded {} default stocks", seeded.len());
        Ok(seeded)
    }
}
