//! Price Update Loop
//!
//! One repeating timer per watched stock symbol. Each tick steps the
//! symbol's price through the simulator and persists the result; tick
//! failures are logged and the timer keeps running. The registry of
//! timers is owned by this service instance and torn down explicitly.

use crate::services::price_sim::PriceSimulator;
use crate::services::stocks::StockService;
use crate::store::DocumentStore;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Per-symbol price update timers.
pub struct PriceFeedService<S> {
    stocks: Arc<StockService<S>>,
    simulator: PriceSimulator,
    update_interval: Duration,
    /// Active timers keyed by symbol. At most one per symbol.
    timers: DashMap<String, JoinHandle<()>>,
}

impl<S: DocumentStore> PriceFeedService<S> {
    pub fn new(
        stocks: Arc<StockService<S>>,
        simulator: PriceSimulator,
        update_interval: Duration,
    ) -> Self {
        Self {
            stocks,
            simulator,
            update_interval,
            timers: DashMap::new(),
        }
    }

    /// Start price updates for a symbol. No-op when a timer is already
    /// running for it.
    pub fn start(&self, symbol: &str, base_price: f64) {
        let symbol = symbol.to_uppercase();

        let entry = match self.timers.entry(symbol.clone()) {
            Entry::Occupied(_) => {
                debug!("Price feed for {} already running", symbol);
                return;
            }
            Entry::Vacant(entry) => entry,
        };

        let stocks = self.stocks.clone();
        let simulator = self.simulator.clone();
        let interval = self.update_interval;
        let task_symbol = symbol.clone();

        let handle = tokio::spawn(async move {
            let mut price = base_price;
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; real ticks follow
            ticker.tick().await;

            loop {
                ticker.tick().await;
                price = simulator.next_price(price, &mut rand::thread_rng());

                if let Err(e) = stocks.update_price(&task_symbol, price).await {
                    warn!("Error updating stock price for {}: {}", task_symbol, e);
                }
            }
        });

        entry.insert(handle);
        info!("Started price feed for {} at {:.2}", symbol, base_price);
    }

    /// Stop price updates for a symbol. No-op when untracked.
    pub fn stop(&self, symbol: &str) {
        let symbol = symbol.to_uppercase();
        if let Some((_, handle)) = self.timers.remove(&symbol) {
            handle.abort();
            info!("Stopped price feed for {}", symbol);
        }
    }

    /// Stop every active timer. Used at shutdown.
    pub fn stop_all(&self) {
        let symbols: Vec<String> = self.timers.iter().map(|e| e.key().clone()).collect();
        for symbol in symbols {
            self.stop(&symbol);
        }
    }

    /// Whether a timer is running for the symbol.
    pub fn is_running(&self, symbol: &str) -> bool {
        self.timers.contains_key(&symbol.to_uppercase())
    }

    /// Symbols with an active timer.
    pub fn active_symbols(&self) -> Vec<String> {
        self.timers.iter().map(|e| e.key().clone()).collect()
    }
}

impl<S> Drop for PriceFeedService<S> {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
    }
}
