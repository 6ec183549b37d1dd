use std::env;

/// Hosted document-store connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base HTTP endpoint of the hosted backend (e.g. `https://backend.example.com/v1`).
    pub endpoint: String,
    /// Project identifier sent with every request.
    pub project_id: String,
    /// Server API key (optional for public collections).
    pub api_key: Option<String>,
    /// Database id. Required before any store call; absence is the
    /// recognized configuration failure.
    pub database_id: Option<String>,
    /// WebSocket endpoint for the realtime feed. Derived from `endpoint`
    /// when unset.
    pub realtime_url: Option<String>,
    /// Per-entity collection ids.
    pub collections: CollectionsConfig,
}

impl BackendConfig {
    /// The realtime WebSocket URL, derived from the HTTP endpoint unless
    /// overridden.
    pub fn realtime_endpoint(&self) -> String {
        self.realtime_url.clone().unwrap_or_else(|| {
            self.endpoint
                .replacen("https://", "wss://", 1)
                .replacen("http://", "ws://", 1)
                + "/realtime"
        })
    }
}

/// Collection ids for each entity.
#[derive(Debug, Clone)]
pub struct CollectionsConfig {
    pub users: String,
    pub games: String,
    pub stocks: String,
    pub leaderboard: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            users: "users".to_string(),
            games: "games".to_string(),
            stocks: "stocks".to_string(),
            leaderboard: "leaderboard".to_string(),
        }
    }
}

/// Price simulation settings.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Market volatility coefficient (0-1, higher = more volatile).
    pub volatility: f64,
    /// Price update interval in milliseconds.
    pub update_interval_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            volatility: 0.02,
            update_interval_ms: 5000,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Hosted backend settings.
    pub backend: BackendConfig,
    /// Price simulation settings.
    pub sim: SimConfig,
    /// How often the resolution sweeper checks for due games (seconds).
    pub resolve_interval_secs: u64,
    /// Stand-in user id until real auth lands.
    pub test_user_id: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);

        let collections = CollectionsConfig {
            users: env::var("COLLECTION_USERS").unwrap_or_else(|_| "users".to_string()),
            games: env::var("COLLECTION_GAMES").unwrap_or_else(|_| "games".to_string()),
            stocks: env::var("COLLECTION_STOCKS").unwrap_or_else(|_| "stocks".to_string()),
            leaderboard: env::var("COLLECTION_LEADERBOARD")
                .unwrap_or_else(|_| "leaderboard".to_string()),
        };

        Self {
            host,
            port,
            backend: BackendConfig {
                endpoint: env::var("BACKEND_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:8080/v1".to_string()),
                project_id: env::var("BACKEND_PROJECT_ID")
                    .unwrap_or_else(|_| "stocksense".to_string()),
                api_key: env::var("BACKEND_API_KEY").ok(),
                database_id: env::var("BACKEND_DATABASE_ID").ok(),
                realtime_url: env::var("BACKEND_REALTIME_URL").ok(),
                collections,
            },
            sim: SimConfig {
                volatility: env::var("PRICE_VOLATILITY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.02),
                update_interval_ms: env::var("PRICE_UPDATE_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5000),
            },
            resolve_interval_secs: env::var("RESOLVE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            test_user_id: env::var("TEST_USER_ID").unwrap_or_else(|_| "test-user".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
