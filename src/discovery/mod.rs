//! Link discovery on a paginated listing page.
//!
//! A walk repeatedly presses the listing's "load more" control and rescans the
//! page. In [`WalkMode::Bulk`] it runs until the control disappears. In
//! [`WalkMode::Incremental`] it also stops at the first scanned link that is
//! already stored, keeping only the links seen before it.

pub mod links;
pub mod walker;

pub use links::{absolutize, scan_links};
pub use walker::{DiscoveryState, DiscoveryWalker, WalkOutcome, WalkState};

use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

use crate::browser::{BrowserError, BrowserProvider};
use crate::repositories::ArticleStore;

#[derive(Clone, Copy)]
pub enum WalkMode<'a> {
    /// Collect every link until pagination is exhausted.
    Bulk,
    /// Stop as soon as a scanned link is found in the store.
    Incremental(&'a dyn ArticleStore),
}

impl WalkMode<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::Incremental(_) => "incremental",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub more_button_xpath: String,
    pub click_timeout: Duration,
    /// Pause between scrolling the control into view and clicking it.
    pub scroll_delay: Duration,
    /// Pause after a click for new items to render.
    pub settle_delay: Duration,
    /// Substring a link must contain to be emitted.
    pub link_pattern: String,
    /// Substring a link must contain to be considered during incremental scans.
    pub section_pattern: String,
    /// Expected number of links, used only for progress reporting.
    pub progress_target: usize,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            more_button_xpath: "//button[text()='MORE']".to_string(),
            click_timeout: Duration::from_secs(10),
            scroll_delay: Duration::from_millis(500),
            settle_delay: Duration::from_secs(2),
            link_pattern: "essay".to_string(),
            section_pattern: "essays".to_string(),
            progress_target: 2500,
        }
    }
}

/// Run one walk in a fresh browser session, closing the session afterwards.
///
/// Incremental lookups resolve links against `site_url`, the same origin the
/// extraction stage fetches from.
///
/// Only failing to start the session is an error; everything after that ends
/// the walk gracefully with whatever was collected.
#[instrument(skip_all, fields(mode = mode.name(), listing = %listing_url))]
pub async fn discover(
    browsers: &dyn BrowserProvider,
    listing_url: &Url,
    site_url: &Url,
    mode: WalkMode<'_>,
    config: &WalkerConfig,
) -> Result<WalkOutcome, BrowserError> {
    let mut browser = browsers.launch().await?;

    let outcome = DiscoveryWalker::new(
        browser.as_mut(),
        listing_url.clone(),
        site_url.clone(),
        mode,
        config.clone(),
    )
    .run()
    .await;

    if let Err(e) = browser.quit().await {
        warn!(error = %e, "failed to close browser session");
    }

    info!(
        mode = mode.name(),
        links = outcome.links.len(),
        cycles = outcome.cycles,
        end = ?outcome.end,
        "discovery finished"
    );
    Ok(outcome)
}
