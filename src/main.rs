//! Clipscout CLI entry point.

use anyhow::Result;
use clap::Parser;
use clipscout::cli::{commands, Cli, Commands};
use clipscout::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("clipscout={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = cli.config.as_ref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    match &cli.command {
        Commands::Doctor => {
            let path = config_path.unwrap_or_else(Settings::default_config_path);
            commands::run_doctor(&settings, &path)?;
        }

        Commands::Ingest { video } => {
            commands::run_ingest(video, settings).await?;
        }

        Commands::Find {
            query,
            transcript,
            no_summary,
            json,
        } => {
            commands::run_find(query, transcript.as_deref(), *no_summary, *json, settings).await?;
        }

        Commands::Chat { transcript } => {
            commands::run_chat(transcript.clone(), settings).await?;
        }

        Commands::List => {
            commands::run_list(settings)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
