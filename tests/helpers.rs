#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use harvest::browser::{Browser, BrowserError, BrowserProvider, ElementHandle};
use harvest::config::{Config, LogFormat};
use harvest::entities::NewArticle;
use harvest::repositories::{ArticleStore, StoreError, StoreProvider};

pub const ESSAY: &str = include_str!("../src/extractor/tests/fixtures/essay.html");

/// Fresh scratch directory for handoff files.
pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("harvest-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn test_config(site: &str, dir: &Path) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        webdriver_url: "http://unused".to_string(),
        site_base_url: Url::parse(site).unwrap(),
        listing_path: "/essays".to_string(),
        link_pattern: "essay".to_string(),
        section_pattern: "essays".to_string(),
        more_button_xpath: "//button[text()='MORE']".to_string(),
        click_timeout: Duration::ZERO,
        settle_delay: Duration::ZERO,
        scroll_delay: Duration::ZERO,
        progress_target: 10,
        fetch_max_attempts: 1,
        fetch_retry_delay: Duration::from_millis(10),
        session_timeout: Duration::from_secs(5),
        extract_concurrency: 4,
        load_batch_size: 2,
        links_file: dir.join("links.csv"),
        articles_file: dir.join("articles.csv"),
        schedule_interval: Duration::from_secs(3600),
        schedule_retries: 1,
        log_format: LogFormat::Text,
    }
}

/// Rows shared by every store a [`MemoryStoreProvider`] hands out.
#[derive(Default)]
pub struct MemoryState {
    rows: Mutex<Vec<NewArticle>>,
    lookups: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl MemoryState {
    pub fn urls(&self) -> Vec<String> {
        self.rows.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn seed(&self, url: &str) {
        self.rows.lock().unwrap().push(NewArticle {
            url: url.to_string(),
            title: Some("Seeded".to_string()),
            content: "Seeded body".to_string(),
            headline: None,
            image: None,
            tags: Vec::new(),
            date: None,
        });
    }
}

struct MemoryStore(Arc<MemoryState>);

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn exists(&self, url: &str) -> Result<bool, StoreError> {
        self.0.lookups.lock().unwrap().push(url.to_string());
        Ok(self.0.rows.lock().unwrap().iter().any(|r| r.url == url))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.0.rows.lock().unwrap().len() as i64)
    }

    async fn insert_batch(&self, rows: &[NewArticle]) -> Result<u64, StoreError> {
        let mut stored = self.0.rows.lock().unwrap();
        let mut inserted = 0;
        for row in rows {
            if !stored.iter().any(|r| r.url == row.url) {
                stored.push(row.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn close(&self) {
        self.0.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MemoryStoreProvider {
    pub state: Arc<MemoryState>,
    pub unreachable: bool,
}

#[async_trait]
impl StoreProvider for MemoryStoreProvider {
    async fn open(&self) -> Result<Box<dyn ArticleStore>, StoreError> {
        if self.unreachable {
            return Err(StoreError::Connection(sqlx::Error::PoolTimedOut));
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryStore(self.state.clone())))
    }
}

/// Listing whose page source after click N is `snapshots[N - 1]`; the
/// "more" control disappears once the snapshots run out.
pub struct ListingBrowser {
    snapshots: Vec<Vec<String>>,
    clicks: usize,
}

#[async_trait]
impl Browser for ListingBrowser {
    async fn open(&mut self, _url: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn find_clickable(
        &mut self,
        xpath: &str,
        timeout: Duration,
    ) -> Result<ElementHandle, BrowserError> {
        if self.clicks < self.snapshots.len() {
            Ok(ElementHandle("more".to_string()))
        } else {
            Err(BrowserError::NotClickable {
                selector: xpath.to_string(),
                timeout,
            })
        }
    }

    async fn scroll_into_view(&mut self, _: &ElementHandle) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn click(&mut self, _: &ElementHandle) -> Result<(), BrowserError> {
        self.clicks += 1;
        Ok(())
    }

    async fn js_click(&mut self, _: &ElementHandle) -> Result<(), BrowserError> {
        self.clicks += 1;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        let anchors: String = self.snapshots[self.clicks - 1]
            .iter()
            .map(|href| format!(r#"<a href="{href}">essay</a>"#))
            .collect();
        Ok(format!("<html><body>{anchors}</body></html>"))
    }

    async fn quit(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }
}

pub struct ListingProvider {
    snapshots: Vec<Vec<String>>,
    launches: AtomicUsize,
}

impl ListingProvider {
    pub fn new(snapshots: &[&[&str]]) -> Self {
        Self {
            snapshots: snapshots
                .iter()
                .map(|page| page.iter().map(|s| s.to_string()).collect())
                .collect(),
            launches: AtomicUsize::new(0),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserProvider for ListingProvider {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ListingBrowser {
            snapshots: self.snapshots.clone(),
            clicks: 0,
        }))
    }
}
