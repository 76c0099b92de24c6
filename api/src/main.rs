// Asset schema API server entry point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::{header, HeaderName, Method};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_schema_api::config::ApiConfig;
use asset_schema_api::db::DbPool;
use asset_schema_api::handlers::{self, AppContext, ACTOR_HEADER};
use asset_schema_api::services::FieldTypeCatalog;

const MAX_IN_FLIGHT_REQUESTS: usize = 256;
const REQUEST_TIMEOUT_SECS: u64 = 30;

fn load_env() {
    dotenv::dotenv().ok();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env();
    // Configure logging with tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load API configuration from environment
    let config = ApiConfig::from_env();
    tracing::info!("Configuration loaded");

    // Establish database connection pool
    let db_pool = DbPool::new(&config).await?;
    tracing::info!("Connected to database");

    let repositories = db_pool.repositories();

    if config.ensure_defaults_on_startup {
        let catalog = FieldTypeCatalog::new(&repositories, &config.engine);
        let field_types = catalog.ensure_defaults().await?;
        tracing::info!("Field type catalog holds {} types", field_types.len());
    }

    let app_state = Arc::new(AppContext::new(repositories, config.engine));

    // Configure CORS policy
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::AUTHORIZATION,
            HeaderName::from_static(ACTOR_HEADER),
        ])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(3600));

    let app = handlers::router(app_state)
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT_REQUESTS))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Parse server address from config
    let addr: SocketAddr = config.server_addr().parse()?;

    // Start HTTP server
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
