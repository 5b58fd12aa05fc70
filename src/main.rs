use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kvdemos::cli::{Cli, Demo, LogFormat};
use kvdemos::config::KvDemoConfig;
use kvdemos::demos;
use kvdemos::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = KvDemoConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    info!(url = %config.store.url, "Configuration loaded");

    let store = Store::open(&config.store.url, cli.demo.db()).await?;
    store.prepare(cli.demo.flush()).await?;

    tokio::select! {
        result = run_demo(&cli.demo, store, &config) => result?,
        _ = shutdown_signal() => warn!("Demo interrupted"),
    }

    Ok(())
}

async fn run_demo(demo: &Demo, store: Store, config: &KvDemoConfig) -> anyhow::Result<()> {
    match demo {
        Demo::RateLimiter { .. } => demos::rate_limiter::run(store, &config.rate_limiting).await?,
        Demo::PerfStrings { n, .. } => {
            demos::perf_strings::run(store, *n).await?;
        }
        Demo::RoleSecurity { .. } => demos::role_security::run(store).await?,
        Demo::Leaderboard { .. } => demos::leaderboard::run(store).await?,
    }
    Ok(())
}

/// Logs go to stderr so they never mix with demo output.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}
