//! redistensor CLI - store and inspect tensors

use anyhow::{Context, Result};
use clap::Parser;
use redistensor::config::{LogConfig, LogFormat};
use redistensor_cli::{Cli, Commands, commands};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: u8, log: &LogConfig) {
    let filter = match verbose {
        0 => log.level.as_directive(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    // Logs go to stderr so `get -o -` keeps stdout clean
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;
    init_tracing(cli.verbose, &settings.log);

    let backend = redistensor::open(&settings.backend)
        .await
        .with_context(|| format!("failed to open {} backend", settings.backend.kind()))?;

    match cli.command {
        Commands::Put { key, file, dtype, shape } => {
            commands::put::execute(backend.as_ref(), &key, &file, dtype, &shape).await?;
        }
        Commands::Get { key, output } => {
            commands::get::execute(backend.as_ref(), &key, output.as_deref()).await?;
        }
        Commands::Ls { pattern, json } => {
            commands::ls::execute(backend.as_ref(), &pattern, json).await?;
        }
        Commands::Shape { key } => {
            commands::stat::shape(backend.as_ref(), &key).await?;
        }
        Commands::Stat { key, json } => {
            commands::stat::execute(backend.as_ref(), &key, json).await?;
        }
    }

    Ok(())
}
