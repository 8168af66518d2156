//! Shartnoma CLI - Legal review of Uzbek and Russian contracts.

use anyhow::Context;
use clap::Parser;
use shartnoma_cli::commands;
use shartnoma_cli::{Cli, Command, Config, Formatter};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => Config::path()?,
    };
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    config.apply_env();

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Analyze(args) => {
            let file = args.file.clone();
            commands::execute_analyze(args, &config, &formatter)
                .await
                .with_context(|| format!("analyzing {}", file))?;
        }
        Command::Detect(args) => commands::execute_detect(args, &config, &formatter).await?,
        Command::Sections(args) => commands::execute_sections(args, &config, &formatter).await?,
        Command::Laws(args) => commands::execute_laws(args, &config, &formatter).await?,
        Command::Config(args) => commands::execute_config(args, &config, &config_path, &formatter).await?,
    }

    Ok(())
}
