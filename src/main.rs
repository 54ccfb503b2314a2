mod cli;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use fbac::config::AppConfig;

#[derive(Parser)]
#[command(name = "fbac", version, about = "Chat with an AI model through a plain-text dialog file")]
struct Cli {
    /// Dialog file; created from the default model and behavior if missing
    file: PathBuf,

    /// Settings file [default: ~/.fbac/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding models.json, behavior_templates.json and default_dialog_config.json
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Validate the dialog file and print a summary without requesting a reply
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(dir) = &cli.config_dir {
        config.registry.config_dir = dir.to_string_lossy().into_owned();
    }

    // Log to stderr so stdout only carries messages meant for the user.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if cli.check {
        cli::check::check(&config, &cli.file)
    } else {
        cli::chat::chat(&config, &cli.file).await
    }
}
