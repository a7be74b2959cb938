use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no clickable element for '{selector}' within {timeout:?}")]
    NotClickable { selector: String, timeout: Duration },

    #[error("click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("webdriver error '{error}': {message}")]
    Protocol { error: String, message: String },

    #[error("unexpected webdriver response: {0}")]
    Response(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for BrowserError {
    fn from(err: reqwest::Error) -> Self {
        BrowserError::Network(err.to_string())
    }
}
