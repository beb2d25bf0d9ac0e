use anyhow::{Context, Result};
use artsy_logging::{artsy_error, artsy_info, LogDestination};
use artsy_server::{run_backfill, serve, Cli, Command};
use clap::Parser;
use log::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config;

    let level = if config.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = if config.log_file {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating {:?}", config.data_dir))?;
        LogDestination::Both(config.data_dir.clone())
    } else {
        LogDestination::Terminal
    };
    artsy_logging::initialize(destination, level);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await.inspect_err(|err| {
            artsy_error!("{:#}", err);
        }),
        Command::Backfill => {
            let summary = run_backfill(&config).await?;
            artsy_info!(
                "Backfill done: {} missing, {} updated, {} failed",
                summary.missing,
                summary.updated,
                summary.failed
            );
            println!(
                "Updated {} of {} artworks missing a description ({} lookups failed)",
                summary.updated, summary.missing, summary.failed
            );
            Ok(())
        }
    }
}
