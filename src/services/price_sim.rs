//! Price Simulation
//!
//! Generates the next price for a stock as a bounded symmetric random
//! walk: each step perturbs the current price by up to half the
//! volatility coefficient in either direction, floored so prices can
//! never reach zero. There is no mean reversion and no upper bound.

use rand::Rng;

/// Configuration for the price walk.
#[derive(Debug, Clone)]
pub struct PriceSimConfig {
    /// Market volatility coefficient (0-1, higher = more volatile).
    pub volatility: f64,
    /// Lowest price a step can produce.
    pub floor: f64,
}

impl Default for PriceSimConfig {
    fn default() -> Self {
        Self {
            volatility: 0.02,
            floor: 0.01,
        }
    }
}

/// Stateless price-step generator.
#[derive(Debug, Clone)]
pub struct PriceSimulator {
    config: PriceSimConfig,
}

impl PriceSimulator {
    /// Create a simulator with the given config.
    pub fn new(config: PriceSimConfig) -> Self {
        Self { config }
    }

    /// Create a simulator with the given volatility and the default floor.
    pub fn with_volatility(volatility: f64) -> Self {
        Self::new(PriceSimConfig {
            volatility,
            ..Default::default()
        })
    }

    /// Compute the next price from the current one.
    ///
    /// `delta = price * volatility * (u - 0.5)` for `u` uniform in [0, 1),
    /// so a step moves at most `volatility / 2` of the price either way.
    pub fn next_price(&self, current_price: f64, rng: &mut impl Rng) -> f64 {
        let change = current_price * self.config.volatility * (rng.gen::<f64>() - 0.5);
        let new_price = current_price + change;

        // Prevent non-positive prices
        new_price.max(self.config.floor)
    }
}

impl Default for PriceSimulator {
    fn default() -> Self {
        Self::new(PriceSimConfig::default())
    }
}
