//! Runs the three stages in sequence: discover links, extract articles, load
//! them into the store.
//!
//! Stages hand off through the link and article files named in [`Config`], so
//! each one can also be run on its own.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::browser::{BrowserProvider, WebDriverProvider};
use crate::config::Config;
use crate::discovery::{self, WalkMode};
use crate::extraction::ExtractionOrchestrator;
use crate::extractor::ArticleRecord;
use crate::fetcher::Fetcher;
use crate::handoff;
use crate::loader::{LoadSummary, Loader};
use crate::repositories::{ArticleStore, PgStoreProvider, StoreProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discover,
    Extract,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Discover => "discover",
            Stage::Extract => "extract",
            Stage::Load => "load",
        })
    }
}

/// What one pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub links: Option<usize>,
    pub records: Option<usize>,
    pub load: Option<LoadSummary>,
    /// Stage that aborted the run; later stages were skipped.
    pub failed_stage: Option<Stage>,
}

impl RunReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            links: None,
            records: None,
            load: None,
            failed_stage: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failed_stage.is_none()
    }
}

/// Something that can execute a full pipeline run.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    /// Run every stage once. Never fails; stage errors are captured in the
    /// report.
    async fn run_once(&self) -> RunReport;
}

pub struct Pipeline {
    config: Config,
    stores: Arc<dyn StoreProvider>,
    browsers: Arc<dyn BrowserProvider>,
    fetcher: Fetcher,
}

impl Pipeline {
    pub fn new(
        config: Config,
        stores: Arc<dyn StoreProvider>,
        browsers: Arc<dyn BrowserProvider>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            config,
            stores,
            browsers,
            fetcher,
        }
    }

    /// Pipeline backed by Postgres and a remote WebDriver hub.
    pub fn from_config(config: Config) -> Result<Self> {
        let stores = Arc::new(PgStoreProvider::new(config.database_url.clone()));
        let browsers = Arc::new(
            WebDriverProvider::new(&config.webdriver_url).context("building WebDriver client")?,
        );
        let fetcher =
            Fetcher::new(config.fetcher_config()).context("building page fetcher")?;

        Ok(Self::new(config, stores, browsers, fetcher))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover new article links and write them to the link file.
    ///
    /// An empty store triggers a bulk walk; otherwise the walk stops at the
    /// first link that is already stored.
    pub async fn extract_links(&self) -> Result<Vec<String>> {
        let listing_url = self.config.listing_url()?;

        let store = self.stores.open().await.context("opening article store")?;
        let walked = self.walk(store.as_ref(), &listing_url).await;
        store.close().await;
        let links = walked?;

        handoff::write_links(&self.config.links_file, &links)?;
        Ok(links)
    }

    async fn walk(&self, store: &dyn ArticleStore, listing_url: &url::Url) -> Result<Vec<String>> {
        let stored = store.count().await.context("counting stored articles")?;
        let mode = if stored == 0 {
            WalkMode::Bulk
        } else {
            WalkMode::Incremental(store)
        };
        info!(stored, mode = mode.name(), "starting discovery");

        let outcome = discovery::discover(
            self.browsers.as_ref(),
            listing_url,
            &self.config.site_base_url,
            mode,
            &self.config.walker_config(),
        )
        .await
        .context("starting browser session")?;

        Ok(outcome.links)
    }

    /// Fetch and extract every link in the link file, writing the article file.
    pub async fn extract_articles(&self) -> Result<Vec<ArticleRecord>> {
        let links = handoff::read_links(&self.config.links_file)?;

        let orchestrator = ExtractionOrchestrator::new(
            self.fetcher.clone(),
            self.config.site_base_url.clone(),
            self.config.extract_concurrency,
        );
        let records = orchestrator.extract_all(&links).await;

        handoff::write_articles(&self.config.articles_file, &records)?;
        Ok(records)
    }

    /// Load the article file into the store.
    pub async fn load_articles(&self) -> Result<LoadSummary> {
        let records = handoff::read_articles(&self.config.articles_file)?;

        let store = self.stores.open().await.context("opening article store")?;
        let summary = Loader::new(store.as_ref(), self.config.load_batch_size)
            .load(records)
            .await;
        store.close().await;

        Ok(summary)
    }

    async fn run_stages(&self, report: &mut RunReport) {
        match self.extract_links().await {
            Ok(links) => report.links = Some(links.len()),
            Err(e) => return abort(report, Stage::Discover, e),
        }

        match self.extract_articles().await {
            Ok(records) => report.records = Some(records.len()),
            Err(e) => return abort(report, Stage::Extract, e),
        }

        match self.load_articles().await {
            Ok(summary) => report.load = Some(summary),
            Err(e) => abort(report, Stage::Load, e),
        }
    }
}

fn abort(report: &mut RunReport, stage: Stage, e: anyhow::Error) {
    error!(%stage, error = ?e, "stage failed, skipping the rest of this run");
    report.failed_stage = Some(stage);
}

#[async_trait]
impl PipelineRunner for Pipeline {
    async fn run_once(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        let mut report = RunReport::new(run_id);

        async {
            info!("pipeline run started");
            self.run_stages(&mut report).await;
            info!(
                links = report.links,
                records = report.records,
                inserted = report.load.as_ref().map(|s| s.successful),
                succeeded = report.succeeded(),
                "pipeline run finished"
            );
        }
        .instrument(info_span!("pipeline_run", %run_id))
        .await;

        report
    }
}
