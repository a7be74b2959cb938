use harvest::config::Config;
use harvest::repositories::{ArticleRepository, ArticleStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let repo = ArticleRepository::connect(&config.database_url, 1).await?;

    // runs all pending migrations; no-op if up-to-date
    let migrated = repo.migrate().await;
    repo.close().await;
    migrated?;

    Ok(())
}
