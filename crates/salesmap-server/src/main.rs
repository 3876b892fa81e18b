mod api;
mod middleware;

use tracing_subscriber::EnvFilter;

use salesmap_core::{EditHistoryLog, Workspace};
use salesmap_storage::Storage;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = salesmap_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let roster = salesmap_core::load_roster(&config.roster_path)?;
    let storage = Storage::from_config(&config)?;

    let loaded = storage.load().await?;
    let workspace = Workspace::load_and_join(loaded, &roster);
    let stats = workspace.stats();
    tracing::info!(
        records = stats.total,
        matched = stats.matched,
        match_rate = format!("{:.1}%", stats.match_rate() * 100.0),
        backend = storage.backend_kind(),
        "dataset loaded and joined"
    );

    let history = EditHistoryLog::load(&config.history_path, config.history_cap)?;

    let state = AppState::new(
        workspace,
        history,
        roster,
        storage,
        config.history_path.clone(),
    );
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
