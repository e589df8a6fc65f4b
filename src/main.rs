use std::{io::Write, sync::Arc};

use anyhow::Result;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weather_dashboard::{
    config::Config,
    dashboard::{Dashboard, Scheduler},
    preferences::FileStorage,
    skins,
    source::ApiClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; variables may come from the environment
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout carries only rendered frames.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let storage = Arc::new(FileStorage::open(&config.preferences_path));
    info!(path = %storage.path().display(), "Preferences loaded");

    let client = ApiClient::new(&config.api_base)?;
    info!(base_url = %client.base_url(), device_id = %config.device_id, "Reading source ready");

    let dashboard = Dashboard::new(Arc::new(client), config.device_id.clone(), storage);
    let skin = skins::build(config.skin, &config.location);

    // Subscribe before the first fetch so no update is missed.
    let mut updates = dashboard.subscribe();
    dashboard.mount();
    let timers = Scheduler::new(
        dashboard.clone(),
        config.latest_refresh(),
        config.history_refresh(),
    )
    .spawn();

    info!(skin = skin.name(), "Dashboard running");
    let render = async {
        loop {
            let frame = skin.render(&dashboard.snapshot().await);
            {
                let mut out = std::io::stdout().lock();
                if let Err(e) = writeln!(out, "{frame}").and_then(|_| out.flush()) {
                    warn!(error = %e, "Failed to write frame");
                }
            }

            if updates.changed().await.is_err() {
                break;
            }
        }
    };

    tokio::select! {
        _ = render => {},
        _ = shutdown_signal() => {},
    }

    timers.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
