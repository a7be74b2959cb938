use crate::fetcher::{backoff::retry_delay, decode::decode_body, errors::FetchError, types::RawPage};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.85 Safari/537.36";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Attempts per URL, counting the first one.
    pub max_attempts: u32,
    /// Base for the jittered delay between attempts.
    pub base_delay: Duration,
    /// Hard cap on any single request, and on the whole extraction session.
    pub session_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
            session_timeout: Duration::from_secs(120),
        }
    }
}

/// HTTP fetcher with bounded, jittered retries.
///
/// Cloning is cheap and clones share one connection pool, so a single
/// `Fetcher` can drive many concurrent fetches.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT.min(config.session_timeout))
            .timeout(config.session_timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: FetcherConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch `url` using the configured attempt bound.
    pub async fn fetch(&self, url: &str) -> Result<RawPage, FetchError> {
        self.fetch_with_attempts(url, self.config.max_attempts).await
    }

    /// Fetch `url`, retrying transport failures up to `max_attempts` times in total.
    ///
    /// A response with any status other than 200 ends the fetch immediately
    /// with [`FetchError::TerminalHttp`].
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_with_attempts(
        &self,
        url: &str,
        max_attempts: u32,
    ) -> Result<RawPage, FetchError> {
        let parsed = Url::parse(url)?;
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let err = match self.attempt(&parsed).await {
                Ok(page) => return Ok(page),
                Err(err) if err.should_retry() => err,
                Err(err) => return Err(err),
            };

            attempt += 1;
            warn!(attempt, error = %err, "fetch attempt failed");

            if attempt >= max_attempts {
                warn!(attempts = attempt, "max retries reached");
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt,
                    last_error: err.to_string(),
                });
            }

            let delay = retry_delay(self.config.base_delay);
            debug!(delay_ms = delay.as_millis() as u64, "retrying");
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self, url: &Url) -> Result<RawPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "non-200 response");
            return Err(FetchError::TerminalHttp { status });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;
        let (body, encoding) = decode_body(&content_type, &body);

        Ok(RawPage {
            url: url.clone(),
            status,
            body,
            encoding: encoding.name(),
        })
    }
}
