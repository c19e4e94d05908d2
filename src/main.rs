use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filedrop_api::config::Config;
use filedrop_api::metrics::MetricRegistry;
use filedrop_api::middleware::instrument::HttpMetrics;
use filedrop_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    // An unreachable backend is fatal here: connect errors propagate out of
    // main and the process exits non-zero.
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let registry = Arc::new(MetricRegistry::new());
    let http_metrics = Arc::new(HttpMetrics::register(&registry)?);

    let state = AppState {
        db: pool,
        config: config.clone(),
        registry,
    };

    let app = build_router(state, http_metrics);

    let addr = format!("{}:{}", config.host, config.port);
    info!("filedrop API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
