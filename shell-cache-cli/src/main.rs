use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use shell_cache::{
    AgentConfig, AssetAgent, BuildManifest, FileStorage, HostClients, HttpNetwork,
    HttpNetworkConfig,
};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod cli;
mod commands;
mod error;

use cli::{CliArgs, Commands};
use commands::CommandExecutor;
use error::AppError;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("shellcache.log")?;

    let multi_writer = MakeWriterExt::and(std::io::stdout, log_file);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(multi_writer)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let build = BuildManifest::from_path(&args.build_manifest)?;
    info!(
        path = %args.build_manifest.display(),
        assets = build.resources.len(),
        core = build.core.len(),
        "Loaded build manifest"
    );

    let config = AgentConfig::builder()
        .with_origin(args.origin.as_str())
        .with_build_manifest(build)
        .with_fetch_gate(!args.no_fetch_gate)
        .build()?;

    info!(
        "HTTP timeout configuration: overall={}s, connect={}s",
        args.timeout, args.connect_timeout
    );
    let network = HttpNetwork::with_config(&HttpNetworkConfig {
        timeout: Duration::from_secs(args.timeout),
        connect_timeout: Duration::from_secs(args.connect_timeout),
        ..HttpNetworkConfig::default()
    })?;

    tokio::fs::create_dir_all(&args.cache_dir).await?;
    let storage = FileStorage::new(args.cache_dir.clone());
    info!(origin = %config.origin, cache_dir = %storage.root().display(), "Starting agent");

    let agent = AssetAgent::new(
        config,
        Arc::new(storage),
        Arc::new(network),
        Arc::new(HostClients::new()),
    );
    let executor = CommandExecutor::new(agent);

    match args.command {
        Commands::Install => executor.install().await?,
        Commands::Activate => executor.activate().await?,
        Commands::Lifecycle => executor.lifecycle().await?,
        Commands::Fetch { target, output } => {
            if target.is_empty() {
                return Err(AppError::InvalidInput("empty fetch target".to_string()));
            }
            executor.fetch(&target, output.as_deref()).await?
        }
        Commands::Message { value } => executor.message(&value).await?,
        Commands::DownloadOffline => executor.download_offline().await?,
        Commands::Status => executor.status().await?,
    }

    Ok(())
}
