use streamwatch::config::MonitorConfig;
use streamwatch::database;
use streamwatch::logging::{init_logging, start_retention_cleanup};
use streamwatch::services::ServiceContainer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env()?;
    let _log_guard = init_logging(config.log_dir.as_deref())?;

    info!(
        database = %config.database_url,
        interval_secs = config.sweep_interval.as_secs(),
        probe_timeout_secs = config.probe_timeout.as_secs(),
        frames_dir = %config.frames_dir.display(),
        "Starting streamwatch v{}",
        env!("CARGO_PKG_VERSION")
    );

    database::ensure_database_dir(&config.database_url).await?;
    let pool = database::init_pool(&config.database_url).await?;
    database::run_migrations(&pool).await?;

    let container = ServiceContainer::new(pool, &config);
    if let Some(log_dir) = &config.log_dir {
        start_retention_cleanup(log_dir.clone(), container.cancellation_token());
    }
    container.start();

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");

    container.shutdown().await?;
    Ok(())
}
