//! Page automation used to drive "load more" pagination.

pub mod error;
pub mod webdriver;

pub use error::BrowserError;
pub use webdriver::{WebDriverBrowser, WebDriverProvider};

use async_trait::async_trait;
use std::time::Duration;

/// Opaque reference to an element inside the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

#[async_trait]
pub trait Browser: Send {
    async fn open(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Wait up to `timeout` for an element matching `xpath` that is displayed
    /// and enabled.
    async fn find_clickable(
        &mut self,
        xpath: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, BrowserError>;

    async fn scroll_into_view(&mut self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Native click. Fails with [`BrowserError::ClickIntercepted`] when another
    /// element would receive it.
    async fn click(&mut self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Click dispatched from script, bypassing overlays.
    async fn js_click(&mut self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Scroll to just above the page end so lazy content renders.
    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError>;

    async fn page_source(&mut self) -> Result<String, BrowserError>;

    async fn quit(&mut self) -> Result<(), BrowserError>;
}

/// Starts browser sessions; each discovery walk gets its own.
#[async_trait]
pub trait BrowserProvider: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError>;
}
