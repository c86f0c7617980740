use meme_vault::{
    auth::StaticApiKeys,
    aws_clients::{create_s3_client, create_sdk_config},
    config::Config,
    errors::AppError,
    repositories::SqliteMemeRepository,
    routes::{create_private_router, create_public_router},
    startup::init_resources,
    storage::S3FileStorage,
    AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "meme_vault=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = Config::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        AppError::InternalServerError(format!("Configuration error: {}", e))
    })?;
    tracing::info!(
        bucket = %config.meme_bucket_name,
        database_url = %config.database_url,
        list_policy = %config.list_policy,
        "Configuration loaded"
    );

    // --- Clients & Resources ---
    let sdk_config = create_sdk_config(&config).await;
    let s3_client = create_s3_client(&sdk_config);

    let pool = init_resources(
        &s3_client,
        &config.meme_bucket_name,
        &config.aws_region,
        &config.database_url,
    )
    .await?;

    // --- Application State ---
    let state = Arc::new(AppState::new(
        Arc::new(SqliteMemeRepository::new(pool)),
        Arc::new(S3FileStorage::new(s3_client, config.meme_bucket_name.clone())),
        Arc::new(StaticApiKeys::new(config.api_keys.clone())),
        config.storage_layout(),
        config.list_policy,
        config.max_upload_bytes,
    ));

    let public_app = create_public_router(state.clone());
    let private_app = create_private_router(state);

    // --- Server Startup ---
    tokio::try_join!(
        serve("public", config.public_bind_address, public_app),
        serve("private", config.private_bind_address, private_app),
    )?;

    Ok(())
}

async fn serve(name: &'static str, addr: SocketAddr, app: axum::Router) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to bind {} API to {}: {}", name, addr, e)))?;
    tracing::info!("{} API listening on http://{}", name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::InternalServerError(format!("{} API server error: {}", name, e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
