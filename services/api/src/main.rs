use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::config::AppConfig;
use api::routes::create_router;
use api::state::AppState;
use api::storage::MemStorage;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting college management service");

    let config = AppConfig::from_env()?;

    let state = match &config.database_url {
        Some(_) => {
            let db_config = common::database::DatabaseConfig::from_env()?;
            let pool = common::database::init_pool(&db_config).await?;

            if !common::database::health_check(&pool).await? {
                anyhow::bail!("Failed to connect to database");
            }
            info!("Database connection successful");

            sqlx::migrate!()
                .run(&pool)
                .await
                .map_err(|e| common::error::DatabaseError::Migration(e.to_string()))?;
            AppState::with_postgres(pool, &config)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory storage with sample data");
            let store = Arc::new(MemStorage::with_sample_data()?);
            AppState::with_memory(store, &config)
        }
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("College management service listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
