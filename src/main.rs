use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use stocksense::api::{self, AppState};
use stocksense::config::Config;
use stocksense::services::{
    AuthService, GameService, LeaderboardService, PriceFeedService, PriceSimulator, StatsService,
    StockService,
};
use stocksense::store::HostedStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stocksense=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!(
        "Starting StockSense server on {}:{}",
        config.host, config.port
    );

    // Connect to the hosted document store. Fails fast when the database
    // id is missing.
    let store = Arc::new(HostedStore::new(&config.backend)?);

    // Build the services
    let collections = &config.backend.collections;
    let stocks = Arc::new(StockService::new(store.clone(), collections.stocks.clone()));
    let leaderboard = Arc::new(LeaderboardService::new(
        store.clone(),
        collections.leaderboard.clone(),
    ));
    let games = Arc::new(GameService::new(
        store.clone(),
        stocks.clone(),
        leaderboard.clone(),
        collections,
    ));
    let stats = Arc::new(StatsService::new(store.clone(), collections.games.clone()));
    let auth = Arc::new(AuthService::new(config.test_user_id.clone()));
    let price_feed = Arc::new(PriceFeedService::new(
        stocks.clone(),
        PriceSimulator::with_volatility(config.sim.volatility),
        Duration::from_millis(config.sim.update_interval_ms),
    ));

    // Seed default stocks on first run, then start a price feed per stock
    stocks.seed_defaults().await?;
    for stock in stocks.list().await? {
        price_feed.start(&stock.symbol, stock.current_price);
    }

    // Start the resolution sweeper
    {
        let games = games.clone();
        let interval_secs = config.resolve_interval_secs;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(tokio::time::Duration::from_secs(interval_secs)).await;
                match games.resolve_due_games().await {
                    Ok(0) => {}
                    Ok(n) => info!("Resolved {} due games", n),
                    Err(e) => warn!("Resolution sweep failed: {}", e),
                }
            }
        });
    }

    // Create application state
    let state = AppState {
        config: config.clone(),
        auth,
        stocks,
        games,
        stats,
        leaderboard,
        price_feed: price_feed.clone(),
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .route("/ws", get(api::stream::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("StockSense server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    price_feed.stop_all();
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received, stopping");
}
