mod cli;
mod config;
mod kubernetes;
mod loki;
mod poller;
mod queue;
mod types;
mod utils;

use clap::Parser;
use tracing::info;

use cli::Cli;
use config::Config;
use kubernetes::KubeOrchestrator;
use loki::LokiTailProber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_file(&cli.config)?;
    info!(
        "Watching namespaces with prefix '{}' every {}s",
        config.namespace_prefix,
        config.poll_interval.as_secs()
    );

    let orchestrator = KubeOrchestrator::from_kubeconfig(&config.kubeconfig_path).await?;
    let prober = LokiTailProber::new(
        config.loki_address.clone(),
        config.loki_websocket_address.clone(),
        config.delay_for,
        config.probe_timeout,
    );

    poller::run(
        &orchestrator,
        &prober,
        &config.namespace_prefix,
        config.poll_interval,
        cli.once,
    )
    .await
}
