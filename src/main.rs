use std::path::Path;

use anyhow::Context;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use dockyard_leads::config::AppConfig;
use dockyard_leads::notify::smtp::install_crypto_provider;
use dockyard_leads::web::{AppState, app_routes};

/// Log to stderr, or to a daily-rolling file when `LOG_DIR` is set.
///
/// The returned guard must live as long as the process or buffered lines
/// are lost on exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "dockyard-leads.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    install_crypto_provider();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let _log_guard = init_tracing(config.log_dir.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.bind_addr,
        leads = %config.leads_path.display(),
        admin_view = config.show_leads,
        "Starting Dockyard Leads"
    );
    match &config.smtp {
        Some(smtp) => info!(
            host = %smtp.host,
            port = smtp.port,
            to = %config.leads_to,
            "Email notifications enabled"
        ),
        None => info!("Email notifications disabled (SMTP not configured)"),
    }

    let app = app_routes(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}
