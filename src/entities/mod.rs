use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row of the `articles` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PersistedArticle {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub headline: Option<String>,
    pub image: Option<String>,
    pub tags: Option<Vec<String>>,
    pub date: Option<NaiveDateTime>,
    pub inserted_at: NaiveDateTime,
}

/// Values for one insert into `articles`; identity and insertion time are
/// assigned by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub headline: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub date: Option<NaiveDateTime>,
}
