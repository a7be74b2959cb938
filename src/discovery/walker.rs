use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{Browser, BrowserError, ElementHandle};
use crate::discovery::links::{absolutize, scan_links};
use crate::discovery::{WalkMode, WalkerConfig};
use crate::repositories::ArticleStore;

/// Walk lifecycle. `Converged` and `Exhausted` are the two ways out of
/// `Expanding`; both lead to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Idle,
    Expanding,
    /// A scanned link was already stored.
    Converged,
    /// The pagination control is gone, or the page stopped responding.
    Exhausted,
    Done,
}

/// Links seen so far in one walk, in first-seen order.
#[derive(Debug, Default)]
pub struct DiscoveryState {
    links: Vec<String>,
    seen: HashSet<String>,
    terminated: bool,
}

impl DiscoveryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.seen.contains(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Add every scanned link; returns how many were new.
    pub fn absorb_all(&mut self, scanned: Vec<String>) -> usize {
        scanned
            .into_iter()
            .filter(|link| self.push(link.clone()))
            .count()
    }

    /// Add scanned links in order until one is already stored.
    ///
    /// Links already in this walk are skipped without a lookup. The stored link
    /// and everything after it in `scanned` are discarded and the state is
    /// marked terminated. A failed lookup counts as "not stored". Returns
    /// whether the walk converged.
    pub async fn absorb_until_known(
        &mut self,
        scanned: Vec<String>,
        base: &Url,
        store: &dyn ArticleStore,
    ) -> bool {
        for link in scanned {
            if self.contains(&link) {
                continue;
            }

            let Some(url) = absolutize(base, &link) else {
                debug!(%link, "skipping unresolvable link");
                continue;
            };

            let known = match store.exists(url.as_str()).await {
                Ok(known) => known,
                Err(e) => {
                    warn!(%url, error = %e, "existence check failed, treating as new");
                    false
                }
            };

            if known {
                info!(%link, "link already ingested, stopping walk");
                self.terminated = true;
                return true;
            }

            debug!(%link, "new link");
            self.push(link);
        }
        false
    }

    /// Accumulated links containing `pattern`.
    pub fn matching(&self, pattern: &str) -> Vec<String> {
        self.links
            .iter()
            .filter(|link| link.contains(pattern))
            .cloned()
            .collect()
    }

    fn push(&mut self, link: String) -> bool {
        if self.seen.insert(link.clone()) {
            self.links.push(link);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct WalkOutcome {
    /// Links matching the content pattern, in first-seen order.
    pub links: Vec<String>,
    /// Number of completed expand cycles.
    pub cycles: usize,
    /// `Converged` or `Exhausted`.
    pub end: WalkState,
}

/// Drives one pagination walk over a single browser session.
pub struct DiscoveryWalker<'a> {
    browser: &'a mut dyn Browser,
    listing_url: Url,
    /// Origin that links are resolved against before store lookups.
    site_url: Url,
    mode: WalkMode<'a>,
    config: WalkerConfig,
    state: WalkState,
    end: WalkState,
    discovery: DiscoveryState,
    cycles: usize,
}

impl<'a> DiscoveryWalker<'a> {
    pub fn new(
        browser: &'a mut dyn Browser,
        listing_url: Url,
        site_url: Url,
        mode: WalkMode<'a>,
        config: WalkerConfig,
    ) -> Self {
        Self {
            browser,
            listing_url,
            site_url,
            mode,
            config,
            state: WalkState::Idle,
            end: WalkState::Exhausted,
            discovery: DiscoveryState::new(),
            cycles: 0,
        }
    }

    pub async fn run(mut self) -> WalkOutcome {
        while self.state != WalkState::Done {
            self.state = self.step().await;
        }

        WalkOutcome {
            links: self.discovery.matching(&self.config.link_pattern),
            cycles: self.cycles,
            end: self.end,
        }
    }

    async fn step(&mut self) -> WalkState {
        match self.state {
            WalkState::Idle => self.open().await,
            WalkState::Expanding => self.expand().await,
            WalkState::Converged | WalkState::Exhausted => {
                self.end = self.state;
                WalkState::Done
            }
            WalkState::Done => WalkState::Done,
        }
    }

    async fn open(&mut self) -> WalkState {
        match self.browser.open(self.listing_url.as_str()).await {
            Ok(()) => WalkState::Expanding,
            Err(e) => {
                warn!(error = %e, "could not open listing page");
                WalkState::Exhausted
            }
        }
    }

    /// One click, wait, scan cycle.
    async fn expand(&mut self) -> WalkState {
        let button = match self
            .browser
            .find_clickable(&self.config.more_button_xpath, self.config.click_timeout)
            .await
        {
            Ok(button) => button,
            Err(e) => {
                info!(reason = %e, "no more pages");
                return WalkState::Exhausted;
            }
        };

        let html = match self.press_and_read(&button).await {
            Ok(html) => html,
            Err(e) => {
                info!(reason = %e, "pagination stopped responding");
                return WalkState::Exhausted;
            }
        };
        self.cycles += 1;

        let scanned = scan_links(&html);
        match self.mode {
            WalkMode::Bulk => {
                let added = self.discovery.absorb_all(scanned);
                info!(
                    cycle = self.cycles,
                    added,
                    unique = self.discovery.len(),
                    target = self.config.progress_target,
                    "collecting links"
                );
                WalkState::Expanding
            }
            WalkMode::Incremental(store) => {
                let pattern = &self.config.section_pattern;
                let section: Vec<String> = scanned
                    .into_iter()
                    .filter(|link| link.contains(pattern.as_str()))
                    .collect();

                let base = self.site_url.clone();
                if self
                    .discovery
                    .absorb_until_known(section, &base, store)
                    .await
                {
                    WalkState::Converged
                } else {
                    debug!(cycle = self.cycles, new = self.discovery.len(), "no known link yet");
                    WalkState::Expanding
                }
            }
        }
    }

    async fn press_and_read(&mut self, button: &ElementHandle) -> Result<String, BrowserError> {
        self.browser.scroll_into_view(button).await?;
        tokio::time::sleep(self.config.scroll_delay).await;

        match self.browser.click(button).await {
            Ok(()) => {}
            Err(BrowserError::ClickIntercepted(reason)) => {
                debug!(%reason, "click intercepted, clicking from script");
                self.browser.js_click(button).await?;
            }
            Err(e) => return Err(e),
        }

        self.browser.scroll_to_bottom().await?;
        tokio::time::sleep(self.config.settle_delay).await;
        self.browser.page_source().await
    }
}
