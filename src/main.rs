use clap::Parser;
use screenshot_service::{
    install_prometheus_recorder, load_config, setup_logging, Cli, CliRunner, Commands,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    if let Err(e) = setup_logging(args.verbose) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }

    info!("Starting screenshot-service v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args).await {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let config = load_config(&args).await?;
    let mut runner = CliRunner::new(config);

    if matches!(args.command, Commands::Serve { .. }) {
        match install_prometheus_recorder() {
            Ok(handle) => runner = runner.with_metrics(handle),
            Err(e) => warn!("Metrics disabled: {}", e),
        }
    }

    runner.run(args.command).await
}
