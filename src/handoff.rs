//! CSV files passed between stages.
//!
//! The link file has a single `Links` column. The article file has
//! `url,title,content,tags,date,image,headline`, with tags joined by commas.
//! Missing fields are written as their placeholder strings and read back as
//! absent, so placeholder text never reaches the rest of the crate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::extractor::ArticleRecord;
use crate::extractor::model::{
    CONTENT_NOT_FOUND, DATE_NOT_FOUND, HEADLINE_NOT_FOUND, TITLE_NOT_FOUND,
};
use crate::loader::split_tags;

#[derive(Error, Debug)]
pub enum HandoffError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl HandoffError {
    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRow {
    #[serde(rename = "Links")]
    link: String,
}

/// One line of the article file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRow {
    pub url: String,
    pub title: String,
    pub content: String,
    pub tags: String,
    pub date: String,
    pub image: String,
    pub headline: String,
}

impl From<&ArticleRecord> for ArticleRow {
    fn from(record: &ArticleRecord) -> Self {
        let or = |field: &Option<String>, placeholder: &str| {
            field.clone().unwrap_or_else(|| placeholder.to_string())
        };

        Self {
            url: record.url.clone(),
            title: or(&record.title, TITLE_NOT_FOUND),
            content: or(&record.content, CONTENT_NOT_FOUND),
            tags: record.tags().join(","),
            date: or(&record.date, DATE_NOT_FOUND),
            image: record.image.clone().unwrap_or_default(),
            headline: or(&record.headline, HEADLINE_NOT_FOUND),
        }
    }
}

impl From<ArticleRow> for ArticleRecord {
    fn from(row: ArticleRow) -> Self {
        Self {
            url: row.url,
            title: present(row.title, TITLE_NOT_FOUND),
            content: present(row.content, CONTENT_NOT_FOUND),
            headline: present(row.headline, HEADLINE_NOT_FOUND),
            date: present(row.date, DATE_NOT_FOUND),
            tags: Some(split_tags(&row.tags)),
            image: Some(row.image).filter(|image| !image.is_empty()),
        }
    }
}

/// `None` when `value` is the placeholder, compared case-insensitively.
fn present(value: String, placeholder: &str) -> Option<String> {
    if value.trim().eq_ignore_ascii_case(placeholder) {
        None
    } else {
        Some(value)
    }
}

pub fn write_links(path: &Path, links: &[String]) -> Result<(), HandoffError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| HandoffError::csv(path, e))?;
    for link in links {
        writer
            .serialize(LinkRow { link: link.clone() })
            .map_err(|e| HandoffError::csv(path, e))?;
    }
    writer.flush().map_err(|source| HandoffError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), count = links.len(), "wrote links");
    Ok(())
}

pub fn read_links(path: &Path) -> Result<Vec<String>, HandoffError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| HandoffError::csv(path, e))?;
    let links = reader
        .deserialize::<LinkRow>()
        .map(|row| row.map(|r| r.link))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| HandoffError::csv(path, e))?;

    info!(path = %path.display(), count = links.len(), "read links");
    Ok(links)
}

pub fn write_articles(path: &Path, records: &[ArticleRecord]) -> Result<(), HandoffError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| HandoffError::csv(path, e))?;
    for record in records {
        writer
            .serialize(ArticleRow::from(record))
            .map_err(|e| HandoffError::csv(path, e))?;
    }
    writer.flush().map_err(|source| HandoffError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), count = records.len(), "wrote articles");
    Ok(())
}

pub fn read_articles(path: &Path) -> Result<Vec<ArticleRecord>, HandoffError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| HandoffError::csv(path, e))?;
    let records = reader
        .deserialize::<ArticleRow>()
        .map(|row| row.map(ArticleRecord::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| HandoffError::csv(path, e))?;

    info!(path = %path.display(), count = records.len(), "read articles");
    Ok(records)
}
