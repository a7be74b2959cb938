//! Concurrent fetch-and-extract over a set of discovered links.

use futures::stream::{self, StreamExt};
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::discovery::absolutize;
use crate::extractor::{self, ArticleRecord, model::FAILURE_TITLE};
use crate::fetcher::{FetchError, Fetcher};

pub struct ExtractionOrchestrator {
    fetcher: Fetcher,
    base_url: Url,
    concurrency: usize,
}

impl ExtractionOrchestrator {
    pub fn new(fetcher: Fetcher, base_url: Url, concurrency: usize) -> Self {
        Self {
            fetcher,
            base_url,
            concurrency: concurrency.max(1),
        }
    }

    /// Absolute URL for a discovered link; links that cannot be resolved are
    /// passed through and fail at fetch time.
    pub fn resolve(&self, link: &str) -> String {
        absolutize(&self.base_url, link)
            .map(String::from)
            .unwrap_or_else(|| link.to_string())
    }

    /// Fetch and extract every link, at most `concurrency` at a time.
    ///
    /// Returns exactly one record per input link, in completion order. Links
    /// that fail, or that are still running when the session timeout elapses,
    /// yield a failure record.
    #[instrument(skip_all, fields(links = links.len(), concurrency = self.concurrency))]
    pub async fn extract_all(&self, links: &[String]) -> Vec<ArticleRecord> {
        let total = links.len();
        let session_timeout = self.fetcher.config().session_timeout;
        let deadline = Instant::now() + session_timeout;
        let urls: Vec<String> = links.iter().map(|link| self.resolve(link)).collect();

        let mut finished = vec![false; total];
        let mut records = Vec::with_capacity(total);
        let progress_step = (total / 10).max(1);

        let mut tasks = stream::iter(urls.iter().cloned().enumerate())
            .map(|(index, url)| async move { (index, self.extract_one(url).await) })
            .buffer_unordered(self.concurrency);

        loop {
            match timeout_at(deadline, tasks.next()).await {
                Ok(Some((index, record))) => {
                    finished[index] = true;
                    debug!(url = %record.url, ok = record.has_content(), "page done");
                    records.push(record);
                    let completed = records.len();
                    if completed % progress_step == 0 || completed == total {
                        info!(completed, total, "scraping pages");
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        timeout_secs = session_timeout.as_secs_f64(),
                        remaining = total - records.len(),
                        "session timeout elapsed, abandoning unfinished pages"
                    );
                    break;
                }
            }
        }
        drop(tasks);

        for (index, url) in urls.into_iter().enumerate() {
            if !finished[index] {
                records.push(ArticleRecord::failed(url, FAILURE_TITLE));
            }
        }

        let failed = records.iter().filter(|r| !r.has_content()).count();
        info!(total, failed, "extraction finished");
        records
    }

    async fn extract_one(&self, url: String) -> ArticleRecord {
        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(FetchError::TerminalHttp { status }) => {
                warn!(%url, status = status.as_u16(), "failed to retrieve");
                return ArticleRecord::failed(
                    url,
                    format!("Failed to retrieve (Status: {})", status.as_u16()),
                );
            }
            Err(e) => {
                warn!(%url, error = %e, "giving up on page");
                return ArticleRecord::failed(url, format!("{FAILURE_TITLE}: {e}"));
            }
        };

        match extractor::extract(&page) {
            Ok(record) => record,
            Err(e) => {
                warn!(%url, error = %e, "extraction failed");
                ArticleRecord::failed(url, FAILURE_TITLE)
            }
        }
    }
}
