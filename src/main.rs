use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use harvest::{
    config::Config,
    pipeline::{Pipeline, PipelineRunner},
    repositories::{ArticleRepository, ArticleStore},
    telemetry,
};

/// Scrape essays from a paginated listing into Postgres.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Override the link handoff file
    #[arg(long, global = true)]
    links_file: Option<PathBuf>,

    /// Override the article handoff file
    #[arg(long, global = true)]
    articles_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Discover, extract and load once
    Run,
    /// Walk the listing and write the link file
    Discover,
    /// Fetch every link in the link file and write the article file
    Extract,
    /// Insert the article file into the database
    Load,
    /// Apply pending database migrations
    Migrate,
    /// Print the number of stored articles
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(path) = cli.links_file {
        config.links_file = path;
    }
    if let Some(path) = cli.articles_file {
        config.articles_file = path;
    }
    telemetry::init(config.log_format);

    match cli.command {
        Command::Migrate => {
            let repo = ArticleRepository::connect(&config.database_url, 1).await?;
            repo.migrate().await.context("applying migrations")?;
            repo.close().await;
            info!("migrations applied");
        }
        Command::Status => {
            let repo = ArticleRepository::connect(&config.database_url, 1).await?;
            let count = repo.count().await;
            repo.close().await;
            println!("{} articles stored", count?);
        }
        command => {
            let pipeline = Pipeline::from_config(config)?;
            match command {
                Command::Discover => {
                    let links = pipeline.extract_links().await?;
                    info!(links = links.len(), "discovery complete");
                }
                Command::Extract => {
                    let records = pipeline.extract_articles().await?;
                    info!(records = records.len(), "extraction complete");
                }
                Command::Load => {
                    let summary = pipeline.load_articles().await?;
                    info!(
                        successful = summary.successful,
                        total = summary.total,
                        failed_batches = summary.failed_batches.len(),
                        "load complete"
                    );
                }
                _ => {
                    let report = pipeline.run_once().await;
                    if let Some(stage) = report.failed_stage {
                        bail!("run {} aborted in the {} stage", report.run_id, stage);
                    }
                }
            }
        }
    }

    Ok(())
}
