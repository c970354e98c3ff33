//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        file_kv::FileKeyValueStore, monitored::MonitoredStudyService, study_llm::OpenAiStudyAdapter,
        PgKeyValueStore,
    },
    config::{Config, StorageBackend},
    error::ApiError,
    web::{build_router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use study_assistant_core::{
    memory_kv::InMemoryKeyValueStore, monitor::CallMonitor, ports::KeyValueStore,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Key-Value Backend ---
    let kv = open_storage(&config).await?;

    // --- 3. Initialize the AI Adapter Behind the Call Monitor ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);
    let study_adapter = Arc::new(OpenAiStudyAdapter::new(
        openai_client,
        config.study_model.clone(),
    ));

    let monitor = CallMonitor::new();
    let study_ai = Arc::new(MonitoredStudyService::new(study_adapter, monitor.clone()));

    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; the admin dashboard routes will refuse every request");
    }

    // --- 4. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(config.clone(), study_ai, kv, monitor));
    let app = build_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>, ApiError> {
    let quota = config.storage_quota_bytes;
    match &config.storage {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; saved sessions are lost on restart");
            Ok(Arc::new(match quota {
                Some(bytes) => InMemoryKeyValueStore::with_quota(bytes),
                None => InMemoryKeyValueStore::new(),
            }))
        }
        StorageBackend::File { data_dir } => {
            info!("Storing sessions under {}", data_dir.display());
            Ok(Arc::new(FileKeyValueStore::new(data_dir.clone(), quota).await?))
        }
        StorageBackend::Postgres { database_url } => {
            info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let store = PgKeyValueStore::new(pool, quota);
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");
            Ok(Arc::new(store))
        }
    }
}
