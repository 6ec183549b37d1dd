pub mod game;
pub mod stock;
pub mod user;

pub use game::{Difficulty, Game, GameResult, PlayerStats, Prediction};
pub use stock::{PriceUpdate, Stock};
pub use user::{LeaderboardEntry, User, STARTING_CURRENCY};
