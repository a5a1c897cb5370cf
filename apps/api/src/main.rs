use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use generation_cell::HttpTextGenerator;
use scheduling_cell::handlers::SchedulingState;
use scheduling_cell::services::{InMemoryDataSource, SchedulingDataSource};
use shared_config::AppConfig;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rehab Scheduler API server");

    // Load configuration
    let config = AppConfig::from_env();

    let data_source: Arc<dyn SchedulingDataSource> = match &config.scheduling_fixture_path {
        Some(path) => match InMemoryDataSource::from_path(path) {
            Ok(source) => Arc::new(source),
            Err(e) => {
                error!("Failed to load scheduling fixture: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            warn!("SCHEDULING_FIXTURE_PATH not set, using built-in sample data");
            Arc::new(InMemoryDataSource::sample(chrono::Local::now().date_naive()))
        }
    };

    if !config.is_generation_configured() {
        warn!("Schedule optimization endpoint will answer 503 until GENERATION_API_URL is set");
    }

    let generator = Arc::new(HttpTextGenerator::new(&config));
    let port = config.server_port;

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Create shared state
    let state = Arc::new(SchedulingState::new(config, data_source, generator));

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
