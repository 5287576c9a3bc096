mod api;
mod config;
mod downloader;
mod errors;
mod input;
mod metadata;
mod processing;
mod utils;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use anyhow::Context;
use clap::Parser;
use log::info;

use crate::downloader::http_pool::HttpPool;
use crate::downloader::manager::{Collaborators, DownloadManager};

#[derive(Parser)]
#[command(name = "song-organizer")]
#[command(version)]
#[command(about = "Download songs listed in a text file into an artist/album tree with cover art and lyrics")]
struct Cli {
    /// Input file with an optional `Album name:` line and one link per line
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Path to a config file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder for the artist/album tree
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let mut config = match config::AppConfig::load(cli.config.as_deref()) {
        Ok(config) => {
            info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            config::AppConfig::default()
        }
    };
    if let Some(input) = cli.input {
        config.input_file = input;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let http_pool = HttpPool::from_config(&config).context("Failed to build HTTP client")?;
    let manager = DownloadManager::new(&config, Collaborators::from_config(&config, &http_pool));

    info!("[RUN] Reading links from {}", config.input_file.display());
    let report = manager
        .run_input_file(&config.input_file)
        .await
        .with_context(|| format!("Failed to read {}", config.input_file.display()))?;

    if report.total() > 0 {
        info!("[RUN] {} of {} song(s) finished", report.succeeded, report.total());
    }
    for (url, reason) in &report.failed {
        log::warn!("[RUN] Failed: {} ({})", url, reason);
    }

    Ok(())
}
