use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tradeable stock as stored in the stocks collection.
///
/// The symbol doubles as the document id; prices are written with two
/// decimal places.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub last_updated: DateTime<Utc>,
}

impl Stock {
    pub fn new(symbol: &str, name: &str, current_price: f64) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            name: name.to_string(),
            current_price,
            last_updated: Utc::now(),
        }
    }
}

/// A realtime price change, as pushed to WebSocket subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: f64,
    /// Milliseconds since epoch.
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_new_uppercases_symbol() {
        let stock = Stock::new("aapl", "Apple Inc.", 150.0);
        assert_eq!(stock.symbol, "AAPL");
        assert_eq!(stock.name, "Apple Inc.");
        assert_eq!(stock.current_price, 150.0);
    }

    #[test]
    fn test_stock_serialization_field_names() {
        let stock = Stock::new("MSFT", "Microsoft Corp.", 300.0);
        let json = serde_json::to_string(&stock).unwrap();

        assert!(json.contains("\"symbol\":\"MSFT\""));
        assert!(json.contains("\"currentPrice\":300.0"));
        assert!(json.contains("\"lastUpdated\""));
    }

    #[test]
    fn test_price_update_serialization() {
        let update = PriceUpdate {
            symbol: "TSLA".to_string(),
            price: 901.25,
            timestamp: 1700000000000,
        };

        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"symbol\":\"TSLA\""));
        assert!(json.contains("\"price\":901.25"));
        assert!(json.contains("\"timestamp\":1700000000000"));
    }
}
