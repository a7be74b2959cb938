//! Persistence for ingested articles.
//!
//! Components depend on the [`ArticleStore`] trait; [`StoreProvider`] hands
//! out a store at the start of a stage and the stage closes it on every exit
//! path.

pub mod article;

pub use article::{ArticleRepository, MAX_BATCH_ROWS, PgStoreProvider};

use async_trait::async_trait;
use thiserror::Error;

use crate::entities::NewArticle;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("batch of {rows} rows failed and was rolled back: {source}")]
    BatchWrite {
        rows: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Whether an article with exactly this URL has been persisted.
    async fn exists(&self, url: &str) -> Result<bool, StoreError>;

    /// Number of persisted articles.
    async fn count(&self) -> Result<i64, StoreError>;

    /// Insert `rows` in one transaction, skipping URLs that already exist.
    ///
    /// Returns the number of rows actually written. On error nothing from
    /// this batch is kept.
    async fn insert_batch(&self, rows: &[NewArticle]) -> Result<u64, StoreError>;

    /// Release the underlying connections.
    async fn close(&self);
}

#[async_trait]
pub trait StoreProvider: Send + Sync {
    async fn open(&self) -> Result<Box<dyn ArticleStore>, StoreError>;
}
