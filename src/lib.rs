pub mod access; // IP-keyed admin gate
pub mod api; // HTTP surface
pub mod clock;
pub mod config;
pub mod core_state;
pub mod diagnosis; // Form schemas + feature encoder
pub mod inference; // Classifier adapters
pub mod screening;
pub mod store; // Record store gateway

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Startup failed: {0}")]
    Core(#[from] core_state::CoreError),
    #[error("Server error: {0}")]
    Server(#[from] api::ServerError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the service and block until Ctrl-C.
pub fn run() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;

    // Blocking HTTP clients must be created and dropped outside the runtime.
    let core = Arc::new(core_state::CoreState::from_config(&config)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let server = api::start_api_server(Arc::clone(&core), config.bind_addr).await?;
        tracing::info!(addr = %server.session.server_addr, "Listening");

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested");
        server.stop().await;
        Ok::<(), AppError>(())
    })?;

    drop(runtime);
    drop(core);
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
