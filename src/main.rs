//! API case batch runner - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use batch_run_lib::api;
use batch_run_lib::config::Config;
use batch_run_lib::db::DbPool;
use batch_run_lib::middleware::RequestLogger;
use batch_run_lib::services::{BatchRunService, HttpExecutionEngine, Stores, UuidIdGenerator};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(std::io::Error::other)?;

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and ENGINE_URL must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  API Case Batch Runner");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL and ENGINE_URL");
    }

    let pool = DbPool::new(&config).await.map_err(std::io::Error::other)?;
    info!("Database connection established");
    pool.run_migrations().await.map_err(std::io::Error::other)?;

    let engine = HttpExecutionEngine::new(&config.engine_url, config.engine_timeout())
        .map_err(std::io::Error::other)?;
    let batch_runs = BatchRunService::new(
        Stores::shared(Arc::new(pool)),
        Arc::new(engine),
        Arc::new(UuidIdGenerator),
        config.batch,
    );
    info!(
        engine_url = %config.engine_url,
        chunk_size = config.batch.chunk_size,
        failure_threshold = config.batch.failure_threshold,
        parallelism = config.batch.parallelism,
        "Batch runner configured"
    );

    let bind_address = config.bind_address();
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            .app_data(web::Data::new(batch_runs.clone()))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_openapi_routes)
                    .configure(api::configure_batch_run_routes),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
