// Harugomin server

use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use harugomin::{api::create_router, app_state::AppState, config::Config, services::ArchiveSweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("harugomin=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    if config.archive.sweep_interval_secs > 0 {
        ArchiveSweeper::new(
            app_state.posts.clone(),
            Duration::from_secs(config.archive.sweep_interval_secs),
        )
        .spawn();
        info!(
            "Archive sweeper running every {}s",
            config.archive.sweep_interval_secs
        );
    }

    let app = create_router(app_state);

    // Start server
    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Harugomin server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
