//! Batched, idempotent loading of extracted articles.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::entities::NewArticle;
use crate::extractor::ArticleRecord;
use crate::extractor::model::CONTENT_NOT_FOUND;
use crate::repositories::ArticleStore;

pub const DEFAULT_BATCH_SIZE: usize = 250;

const DATE_FORMATS: &[&str] = &["%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y", "%Y-%m-%d"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Rows submitted in batches that committed, duplicates included.
    pub successful: usize,
    /// Rows left after filtering.
    pub total: usize,
    /// Records dropped for having no content.
    pub removed: usize,
    /// Rows the database actually wrote.
    pub inserted: u64,
    /// 1-based numbers of batches that were rolled back.
    pub failed_batches: Vec<usize>,
}

/// Split a comma-delimited tag string into trimmed, non-empty tags.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the free-text publish date printed on article pages.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn has_content(record: &ArticleRecord) -> bool {
    record
        .content
        .as_deref()
        .is_some_and(|content| !content.trim().eq_ignore_ascii_case(CONTENT_NOT_FOUND))
}

/// Drop records without content and convert the rest to insert rows.
///
/// Returns the rows and the number of records dropped.
pub fn prepare(records: Vec<ArticleRecord>) -> (Vec<NewArticle>, usize) {
    let received = records.len();

    let rows: Vec<NewArticle> = records
        .into_iter()
        .filter(has_content)
        .map(|record| NewArticle {
            date: record.date.as_deref().and_then(parse_date),
            tags: record.tags().to_vec(),
            content: record.content.unwrap_or_default(),
            url: record.url,
            title: record.title,
            headline: record.headline,
            image: record.image,
        })
        .collect();

    let removed = received - rows.len();
    if removed > 0 {
        info!(removed, "removed rows with 'content not found'");
    }
    (rows, removed)
}

pub struct Loader<'a> {
    store: &'a dyn ArticleStore,
    batch_size: usize,
}

impl<'a> Loader<'a> {
    pub fn new(store: &'a dyn ArticleStore, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Insert `records` in fixed-size batches.
    ///
    /// A failing batch is rolled back and skipped; the remaining batches are
    /// still attempted.
    #[instrument(skip_all, fields(records = records.len(), batch_size = self.batch_size))]
    pub async fn load(&self, records: Vec<ArticleRecord>) -> LoadSummary {
        let (rows, removed) = prepare(records);
        let mut summary = LoadSummary {
            total: rows.len(),
            removed,
            ..LoadSummary::default()
        };
        let started = Instant::now();

        for (index, batch) in rows.chunks(self.batch_size).enumerate() {
            let number = index + 1;
            match self.store.insert_batch(batch).await {
                Ok(inserted) => {
                    summary.successful += batch.len();
                    summary.inserted += inserted;
                    info!(
                        batch = number,
                        submitted = batch.len(),
                        inserted,
                        progress = summary.successful,
                        total = summary.total,
                        "inserting articles"
                    );
                }
                Err(e) => {
                    error!(batch = number, offset = index * self.batch_size, error = %e, "batch insertion failed");
                    summary.failed_batches.push(number);
                }
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            summary.successful as f64 / elapsed
        } else {
            0.0
        };
        info!(
            elapsed_secs = elapsed,
            rows_per_sec = rate,
            "batch insertion completed: {}/{} total rows inserted",
            summary.successful,
            summary.total
        );
        summary
    }
}
