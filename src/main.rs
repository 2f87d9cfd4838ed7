use clap::Parser;
use tracing_subscriber::EnvFilter;

use courier::cli::Cli;
use courier::config::Config;
use courier::server::{self, Shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let cfg = Config::load(args.config.as_deref())?.with_port(args.port);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();

    let shutdown = Shutdown::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            signal.trigger();
        }
    });

    server::listener::run(&cfg, shutdown).await
}
