use crate::entities::{NewArticle, PersistedArticle};
use crate::repositories::{ArticleStore, StoreError, StoreProvider};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Bind parameters Postgres accepts in one statement.
const BIND_LIMIT: usize = u16::MAX as usize;
/// Columns bound per row by `insert_batch`.
const INSERT_COLUMNS: usize = 7;

/// Largest batch `insert_batch` can send as a single statement.
pub const MAX_BATCH_ROWS: usize = BIND_LIMIT / INSERT_COLUMNS;

/// Postgres-backed article store.
#[derive(Clone)]
pub struct ArticleRepository {
    pool: PgPool,
}

impl ArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await
            .map_err(StoreError::Connection)?;

        info!("connected to article database");
        Ok(Self::new(pool))
    }

    /// Create or upgrade the schema; no-op when up to date.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("articles schema verified");
        Ok(())
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<PersistedArticle>, StoreError> {
        let article = sqlx::query_as::<_, PersistedArticle>(
            r#"
            SELECT id, url, title, content, headline, image, tags, date, inserted_at
            FROM articles
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }
}

#[async_trait]
impl ArticleStore for ArticleRepository {
    #[instrument(skip(self))]
    async fn exists(&self, url: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM articles WHERE url = $1)")
                .bind(url)
                .fetch_one(&self.pool)
                .await?;

        debug!(exists, "url check");
        Ok(exists)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn insert_batch(&self, rows: &[NewArticle]) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let batch_error = |source| StoreError::BatchWrite {
            rows: rows.len(),
            source,
        };

        let mut tx = self.pool.begin().await.map_err(batch_error)?;

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO articles (url, title, content, headline, image, tags, date) ",
        );
        builder.push_values(rows, |mut b, row| {
            b.push_bind(row.url.clone())
                .push_bind(row.title.clone())
                .push_bind(row.content.clone())
                .push_bind(row.headline.clone())
                .push_bind(row.image.clone())
                .push_bind(row.tags.clone())
                .push_bind(row.date);
        });
        builder.push(" ON CONFLICT (url) DO NOTHING");

        // Dropping `tx` on the error path rolls the batch back.
        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(batch_error)?;
        tx.commit().await.map_err(batch_error)?;

        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("article database connection closed");
    }
}

/// Opens a fresh Postgres store per stage and ensures the schema exists.
#[derive(Debug, Clone)]
pub struct PgStoreProvider {
    database_url: String,
    max_connections: u32,
}

impl PgStoreProvider {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 2,
        }
    }
}

#[async_trait]
impl StoreProvider for PgStoreProvider {
    async fn open(&self) -> Result<Box<dyn ArticleStore>, StoreError> {
        let repo = ArticleRepository::connect(&self.database_url, self.max_connections).await?;
        if let Err(e) = repo.migrate().await {
            repo.close().await;
            return Err(e);
        }
        Ok(Box::new(repo))
    }
}
