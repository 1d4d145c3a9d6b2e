/// Posts Repository
///
/// Database operations for ranking candidate selection and label lookup.
/// Filtering happens here; scoring, deduplication and truncation happen
/// in the ranking service over the returned candidate set.
use sqlx::PgPool;
use tracing::error;

use crate::error::{AppError, Result};
use crate::models::{Label, PostRow};
use crate::services::filter::FilterPolicy;

const CANDIDATE_COLUMNS: &str = r#"
    p.id,
    p.sid,
    p.pid,
    p.text,
    p.url,
    COALESCE(p.content_url, '') AS content_url,
    p.score,
    p.created_at,
    s.title AS source_title,
    COALESCE(s.logo_url, '') AS source_logo_url,
    s.score_avg
"#;

/// Posts Repository
#[derive(Clone)]
pub struct PostsRepo {
    pool: PgPool,
}

impl PostsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch ranking candidates for the general (strength/trending)
    /// queries: non-empty text, deny-lists applied, optional minimum raw
    /// score, optional label membership requirement.
    ///
    /// `created_after` is an epoch-seconds cutoff; pass 0 for no window.
    pub async fn ranking_candidates(
        &self,
        filter: &FilterPolicy,
        created_after: i64,
        min_score: Option<f64>,
        labels: Option<&[String]>,
    ) -> Result<Vec<PostRow>> {
        let sql = format!(
            r#"
            SELECT {CANDIDATE_COLUMNS}
            FROM posts p
            JOIN sources s ON p.sid = s.id
            WHERE p.text IS NOT NULL
                AND p.text <> ''
                AND p.created_at > $1
                AND p.pid NOT LIKE ALL($2)
                AND p.sid <> ALL($3)
                AND ($4::FLOAT8 IS NULL OR p.score > $4)
                AND ($5::TEXT[] IS NULL OR EXISTS (
                    SELECT 1 FROM post_labels pl
                    WHERE pl.post_id = p.id AND pl.label = ANY($5)
                ))
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(created_after)
            .bind(filter.deny_pid_patterns())
            .bind(&filter.deny_source_ids)
            .bind(min_score)
            .bind(labels.map(<[String]>::to_vec))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch ranking candidates: {}", e);
                AppError::Database(e.to_string())
            })?;

        Ok(rows)
    }

    /// Fetch announcement candidates: the channel prefix list becomes an
    /// allow-list and the general exclusions do not apply.
    pub async fn announcement_candidates(
        &self,
        filter: &FilterPolicy,
        created_after: i64,
    ) -> Result<Vec<PostRow>> {
        let sql = format!(
            r#"
            SELECT {CANDIDATE_COLUMNS}
            FROM posts p
            JOIN sources s ON p.sid = s.id
            WHERE p.created_at > $1
                AND p.pid LIKE ANY($2)
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(created_after)
            .bind(filter.announcement_pid_patterns())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to fetch announcement candidates: {}", e);
                AppError::Database(e.to_string())
            })?;

        Ok(rows)
    }

    /// Batch-fetch all labels for the given post ids, ordered by post id
    /// then label. Batch size is bounded by the page size since this runs
    /// after truncation.
    pub async fn labels_for_posts(&self, post_ids: &[String]) -> Result<Vec<Label>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let labels = sqlx::query_as::<_, Label>(
            r#"
            SELECT post_id, label
            FROM post_labels
            WHERE post_id = ANY($1)
            ORDER BY post_id, label
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch labels for posts: {}", e);
            AppError::Database(e.to_string())
        })?;

        Ok(labels)
    }
}
