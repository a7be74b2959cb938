//! Minimal W3C WebDriver client for a remote Selenium hub.

use crate::browser::{Browser, BrowserError, BrowserProvider, ElementHandle};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Key under which W3C WebDriver serializes element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.85 Safari/537.36";

const SCROLL_INTO_VIEW_JS: &str =
    "arguments[0].scrollIntoView({block: 'center', inline: 'nearest'});";
const CLICK_JS: &str = "arguments[0].click();";
const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight - 200);";

#[derive(Debug, Clone)]
pub struct WebDriverProvider {
    client: Client,
    base_url: String,
}

impl WebDriverProvider {
    pub fn new(base_url: &str) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BrowserProvider for WebDriverProvider {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError> {
        let browser = WebDriverBrowser::start(self.client.clone(), &self.base_url).await?;
        Ok(Box::new(browser))
    }
}

/// One headless Chrome session.
pub struct WebDriverBrowser {
    client: Client,
    session_url: String,
}

impl WebDriverBrowser {
    /// Create a new session on the hub at `base_url`.
    #[instrument(skip(client))]
    pub async fn start(client: Client, base_url: &str) -> Result<Self, BrowserError> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            format!("user-agent={USER_AGENT}"),
                            "--headless",
                            "--disable-gpu",
                            "--no-sandbox",
                            "--disable-dev-shm-usage",
                        ]
                    }
                }
            }
        });

        let value = send(&client, Method::POST, &format!("{base_url}/session"), Some(capabilities))
            .await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Response(format!("missing sessionId in {value}")))?;

        debug!(session_id, "webdriver session started");
        Ok(Self {
            client,
            session_url: format!("{base_url}/session/{session_id}"),
        })
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = format!("{}{}", self.session_url, path);
        send(&self.client, method, &url, body).await
    }

    async fn execute(&self, script: &str, element: Option<&ElementHandle>) -> Result<(), BrowserError> {
        let args = match element {
            Some(el) => {
                let id = el.0.clone();
                vec![json!({ ELEMENT_KEY: id })]
            }
            None => Vec::new(),
        };
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await?;
        Ok(())
    }

    async fn find_element(&self, xpath: &str) -> Result<ElementHandle, BrowserError> {
        let value = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": "xpath", "value": xpath })),
            )
            .await?;

        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementHandle(id.to_string()))
            .ok_or_else(|| BrowserError::Response(format!("missing element reference in {value}")))
    }

    async fn element_flag(&self, element: &ElementHandle, flag: &str) -> Result<bool, BrowserError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/{flag}", element.0), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&mut self, url: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn find_clickable(
        &mut self,
        xpath: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, BrowserError> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.find_element(xpath).await {
                Ok(element) => {
                    if self.element_flag(&element, "displayed").await?
                        && self.element_flag(&element, "enabled").await?
                    {
                        return Ok(element);
                    }
                }
                Err(BrowserError::Protocol { error, .. })
                    if error == "no such element" || error == "stale element reference" => {}
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(BrowserError::NotClickable {
                    selector: xpath.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.execute(SCROLL_INTO_VIEW_JS, Some(element)).await
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", element.0),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn js_click(&mut self, element: &ElementHandle) -> Result<(), BrowserError> {
        self.execute(CLICK_JS, Some(element)).await
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        self.execute(SCROLL_TO_BOTTOM_JS, None).await
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        let value = self.command(Method::GET, "/source", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Response("page source was not a string".to_string()))
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        self.command(Method::DELETE, "", None).await?;
        debug!("webdriver session closed");
        Ok(())
    }
}

/// Issue one WebDriver command and unwrap its `value` member.
async fn send(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, BrowserError> {
    let mut request = client.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let mut payload: Value = response.json().await?;
    let value = payload
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if error == "element click intercepted" {
        return Err(BrowserError::ClickIntercepted(message));
    }
    if error != "no such element" {
        warn!(status = status.as_u16(), %error, "webdriver command failed");
    }
    Err(BrowserError::Protocol { error, message })
}
