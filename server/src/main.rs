use anyhow::Context;
use maplead_core::AppConfig;
use maplead_export::XlsxExporter;
use maplead_scraper::{ChromiumLauncher, ControllerSettings, ScrapeController};
use maplead_server::{build_app, AppState};
use std::sync::Arc;
use tracing::info;

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,maplead=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting maplead v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_with_env().context("failed to load configuration")?;

    let controller = Arc::new(ScrapeController::new(
        Arc::new(ChromiumLauncher::new(
            config.browser.clone(),
            config.scraping.clone(),
        )),
        Arc::new(XlsxExporter::new(&config.export.output_path)),
        ControllerSettings::from(&config.scraping),
    ));
    info!("Exports go to {}", controller.output_path().display());

    let app = build_app(AppState::new(Arc::clone(&controller)), &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if controller.status().state.is_active() {
        info!("Stopping running scrape job before exit");
        controller.stop();
        let status = controller.wait().await;
        info!("Scrape job ended as {}", status.state);
    }
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
