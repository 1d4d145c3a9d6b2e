use serde::{Deserialize, Serialize};

/// One candidate row from the posts/sources join.
///
/// `pid` is the provider-specific post id, structured as
/// `provider:channel:id` and used for channel prefix filtering.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostRow {
    pub id: String,
    pub sid: String,
    pub pid: String,
    pub text: Option<String>,
    pub url: String,
    pub content_url: String,
    pub score: f64,
    /// Seconds since epoch.
    pub created_at: i64,
    pub source_title: String,
    pub source_logo_url: String,
    pub score_avg: f64,
}

impl PostRow {
    /// Canonical URL used to group cross-posted duplicates.
    pub fn main_url(&self) -> &str {
        if self.content_url.is_empty() {
            &self.url
        } else {
            &self.content_url
        }
    }
}

/// A label attached to a post. A post may carry zero or more labels.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Label {
    pub post_id: String,
    pub label: String,
}

/// A post enriched with source metadata, its ranking score and labels.
/// This is the unit returned to callers and the unit stored in the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPost {
    pub id: String,
    pub sid: String,
    pub pid: String,
    pub text: Option<String>,
    pub url: String,
    pub content_url: String,
    pub main_url: String,
    pub score: f64,
    pub created_at: i64,
    pub source_title: String,
    pub source_logo_url: String,
    pub score_avg: f64,
    /// Strength or trending score depending on the ranking mode.
    pub strength: f64,
    pub labels: Vec<Label>,
}

impl RankedPost {
    pub fn from_row(row: PostRow, strength: f64, labels: Vec<Label>) -> Self {
        let main_url = row.main_url().to_string();
        Self {
            id: row.id,
            sid: row.sid,
            pid: row.pid,
            text: row.text,
            url: row.url,
            content_url: row.content_url,
            main_url,
            score: row.score,
            created_at: row.created_at,
            source_title: row.source_title,
            source_logo_url: row.source_logo_url,
            score_avg: row.score_avg,
            strength,
            labels,
        }
    }
}
