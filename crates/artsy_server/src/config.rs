use std::path::PathBuf;

use artsy_engine::{ImageSize, ProviderSettings, DEFAULT_API_BASE, DEFAULT_IIIF_BASE};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "artsy")]
#[command(about = "Art discovery and slideshow server", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: ServerConfig,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Fetch missing descriptions for saved artworks
    Backfill,
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Directory holding state.json, images and the log file
    #[arg(long, env = "ARTSY_DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Address to listen on
    #[arg(long, env = "ARTSY_BIND", default_value = "0.0.0.0:5000", global = true)]
    pub bind: String,

    /// Base URL of the museum JSON API
    #[arg(long, env = "ARTSY_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Base URL of the IIIF image service
    #[arg(long, env = "ARTSY_IIIF_BASE", default_value = DEFAULT_IIIF_BASE, global = true)]
    pub iiif_base: String,

    /// IIIF size token for downloaded images (max, !W,H, W,, ,H or pct:N)
    #[arg(long, env = "ARTSY_IMAGE_SIZE", default_value = "max", global = true)]
    pub image_size: ImageSize,

    /// Also write logs to {data-dir}/artsy.log
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,
}

impl ServerConfig {
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            api_base: self.api_base.clone(),
            iiif_base: self.iiif_base.clone(),
            ..ProviderSettings::default()
        }
    }
}
