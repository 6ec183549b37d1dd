pub mod auth;
pub mod game;
pub mod leaderboard;
pub mod price_feed;
pub mod price_sim;
pub mod stats;
pub mod stocks;

pub use auth::AuthService;
pub use game::GameService;
pub use leaderboard::LeaderboardService;
pub use price_feed::PriceFeedService;
pub use price_sim::{PriceSimConfig, PriceSimulator};
pub use stats::{fold_stats, StatsService};
pub use stocks::{StockService, DEFAULT_STOCKS};
