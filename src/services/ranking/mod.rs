//! Ranking pipeline
//!
//! Request flow: cache lookup by derived key → on miss, fetch filtered
//! candidates, score them, collapse duplicates by main URL, truncate,
//! attach labels, insert into the cache, return. The refresh scheduler
//! drives the same pipeline through `refresh_top`/`refresh_trending`.
//!
//! Labels are attached before cache insertion; cached entries are
//! immutable from that point on.

pub mod dedup;
pub mod scorer;

use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::cache::{self, RankingCache};
use crate::config::RankingConfig;
use crate::db::PostsRepo;
use crate::error::{AppError, Result};
use crate::models::{Label, PostRow, RankedPost};
use crate::services::filter::FilterPolicy;
use dedup::ScoredPost;

/// How candidates are scored and ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScoreMode {
    /// `score / score_avg`, no time decay.
    Strength,
    /// Log score ratio with linear age penalty.
    Trending,
    /// Newest first; used by announcements, which carry no score.
    Recency,
}

#[derive(Clone)]
pub struct RankingService {
    repo: PostsRepo,
    cache: RankingCache,
    config: RankingConfig,
    filter: FilterPolicy,
}

impl RankingService {
    pub fn new(
        pool: PgPool,
        cache: RankingCache,
        config: RankingConfig,
        filter: FilterPolicy,
    ) -> Self {
        Self {
            repo: PostsRepo::new(pool),
            cache,
            config,
            filter,
        }
    }

    /// Rank posts carrying at least one of the requested labels, by
    /// strength. Fails with `InvalidRequest` when the label set is empty.
    pub async fn rank_by_labels(
        &self,
        labels: &[String],
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Arc<Vec<RankedPost>>> {
        if labels.is_empty() {
            return Err(AppError::InvalidRequest(
                "missing label parameter".to_string(),
            ));
        }

        let key = cache::labels_key(labels);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let limit = self.config.effective_label_limit(limit);
        let rows = self
            .repo
            .ranking_candidates(&self.filter, 0, None, Some(labels))
            .await
            .map_err(|e| {
                error!(ranking = "labels", ?labels, error = %e, "Label ranking query failed");
                e
            })?;
        let posts = self
            .finish(rows, ScoreMode::Strength, offset, Some(limit))
            .await?;

        Ok(self.cache.set(key, posts))
    }

    /// Rank recent posts by time-decayed trending score.
    pub async fn rank_trending(&self) -> Result<Arc<Vec<RankedPost>>> {
        if let Some(hit) = self.cache.get(cache::TRENDING_KEY) {
            debug!("Cache hit for {}", cache::TRENDING_KEY);
            return Ok(hit);
        }

        let posts = self.compute_trending().await?;
        Ok(self.cache.set(cache::TRENDING_KEY, posts))
    }

    /// Rank posts within an age window by strength.
    pub async fn rank_top(&self, age_hours: Option<i64>) -> Result<Arc<Vec<RankedPost>>> {
        let age_hours = self.config.effective_top_age(age_hours);

        let key = cache::top_key(age_hours);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let posts = self.compute_top(age_hours).await?;
        Ok(self.cache.set(key, posts))
    }

    /// Newest-first feed of posts from the announcement channels.
    pub async fn rank_announcements(&self, age_hours: Option<i64>) -> Result<Arc<Vec<RankedPost>>> {
        let age_hours = self.config.effective_announcements_age(age_hours);

        let key = cache::announcements_key(age_hours);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let cutoff = age_cutoff(age_hours);
        let rows = self
            .repo
            .announcement_candidates(&self.filter, cutoff)
            .await
            .map_err(|e| {
                error!(ranking = "announcements", age_hours, error = %e, "Announcements query failed");
                e
            })?;
        let posts = self.finish(rows, ScoreMode::Recency, 0, None).await?;

        Ok(self.cache.set(key, posts))
    }

    /// Recompute the top ranking for an age window and overwrite its
    /// cache entry. Returns the number of cached posts.
    pub async fn refresh_top(&self, age_hours: i64) -> Result<usize> {
        let posts = self.compute_top(age_hours).await?;
        let count = posts.len();
        self.cache.set(cache::top_key(age_hours), posts);
        Ok(count)
    }

    /// Recompute the trending ranking and overwrite its cache entry.
    pub async fn refresh_trending(&self) -> Result<usize> {
        let posts = self.compute_trending().await?;
        let count = posts.len();
        self.cache.set(cache::TRENDING_KEY, posts);
        Ok(count)
    }

    async fn compute_top(&self, age_hours: i64) -> Result<Vec<RankedPost>> {
        let cutoff = age_cutoff(age_hours);
        let rows = self
            .repo
            .ranking_candidates(&self.filter, cutoff, None, None)
            .await
            .map_err(|e| {
                error!(ranking = "top", age_hours, error = %e, "Top ranking query failed");
                e
            })?;
        self.finish(
            rows,
            ScoreMode::Strength,
            0,
            Some(self.config.top_default_limit),
        )
        .await
    }

    async fn compute_trending(&self) -> Result<Vec<RankedPost>> {
        let cutoff = age_cutoff(self.config.trending_age_hours);
        let rows = self
            .repo
            .ranking_candidates(
                &self.filter,
                cutoff,
                Some(self.config.trending_min_score),
                None,
            )
            .await
            .map_err(|e| {
                error!(ranking = "trending", error = %e, "Trending ranking query failed");
                e
            })?;
        self.finish(
            rows,
            ScoreMode::Trending,
            0,
            Some(self.config.trending_limit),
        )
        .await
    }

    /// Shared tail of the pipeline: score → dedupe → truncate → attach
    /// labels. Unscorable candidates are dropped, not clamped.
    async fn finish(
        &self,
        rows: Vec<PostRow>,
        mode: ScoreMode,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<RankedPost>> {
        let now = unix_now();
        let scored = score_candidates(rows, mode, now, self.config.decay_seconds);
        let page: Vec<ScoredPost> = dedup::collapse_by_main_url(scored)
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        let post_ids: Vec<String> = page.iter().map(|p| p.row.id.clone()).collect();
        let labels = self.repo.labels_for_posts(&post_ids).await?;
        Ok(attach_labels(page, labels))
    }
}

fn score_candidates(
    rows: Vec<PostRow>,
    mode: ScoreMode,
    now: i64,
    decay_seconds: f64,
) -> Vec<ScoredPost> {
    rows.into_iter()
        .filter_map(|row| {
            let strength = match mode {
                ScoreMode::Strength => scorer::strength(row.score, row.score_avg),
                ScoreMode::Trending => {
                    scorer::trending(row.score, row.score_avg, row.created_at, now, decay_seconds)
                }
                ScoreMode::Recency => Some(row.created_at as f64),
            }?;
            Some(ScoredPost { row, strength })
        })
        .collect()
}

/// Group the fetched labels by post id and build the final ranked posts.
/// Produces new values; nothing already cached is touched.
fn attach_labels(page: Vec<ScoredPost>, labels: Vec<Label>) -> Vec<RankedPost> {
    let mut by_post: HashMap<String, Vec<Label>> = HashMap::new();
    for label in labels {
        by_post.entry(label.post_id.clone()).or_default().push(label);
    }

    page.into_iter()
        .map(|post| {
            let labels = by_post.remove(&post.row.id).unwrap_or_default();
            RankedPost::from_row(post.row, post.strength, labels)
        })
        .collect()
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Epoch-seconds cutoff for an age window. Saturates so an extreme age
/// pins the cutoff at the epoch bounds instead of overflowing.
fn age_cutoff(age_hours: i64) -> i64 {
    unix_now().saturating_sub(age_hours.saturating_mul(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, score: f64, score_avg: f64, created_at: i64) -> PostRow {
        PostRow {
            id: id.to_string(),
            sid: "s1".to_string(),
            pid: format!("discord:1:{}", id),
            text: Some("text".to_string()),
            url: format!("https://example.com/{}", id),
            content_url: String::new(),
            score,
            created_at,
            source_title: "Source".to_string(),
            source_logo_url: String::new(),
            score_avg,
        }
    }

    #[test]
    fn strength_mode_excludes_zero_average_sources() {
        let scored = score_candidates(
            vec![row("p1", 10.0, 2.0, 0), row("p2", 10.0, 0.0, 0)],
            ScoreMode::Strength,
            0,
            90000.0,
        );
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].row.id, "p1");
        assert_eq!(scored[0].strength, 5.0);
    }

    #[test]
    fn trending_mode_excludes_non_positive_ratio() {
        let now = 1_700_000_000;
        let scored = score_candidates(
            vec![row("p1", 10.0, 2.0, now), row("p2", 0.0, 2.0, now)],
            ScoreMode::Trending,
            now,
            90000.0,
        );
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].row.id, "p1");
    }

    #[test]
    fn recency_mode_scores_by_created_at() {
        let scored = score_candidates(
            vec![row("p1", 0.0, 0.0, 100), row("p2", 0.0, 0.0, 200)],
            ScoreMode::Recency,
            0,
            90000.0,
        );
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].strength, 100.0);
        assert_eq!(scored[1].strength, 200.0);
    }

    #[test]
    fn age_cutoff_saturates_on_extreme_ages() {
        assert_eq!(age_cutoff(i64::MAX), i64::MIN);
        assert!(age_cutoff(0) > 0);
        assert!(age_cutoff(168) < age_cutoff(72));
    }

    #[test]
    fn attach_labels_groups_by_post_id() {
        let page = vec![
            ScoredPost {
                row: row("p1", 10.0, 2.0, 0),
                strength: 5.0,
            },
            ScoredPost {
                row: row("p2", 8.0, 2.0, 0),
                strength: 4.0,
            },
        ];
        let labels = vec![
            Label {
                post_id: "p1".to_string(),
                label: "nano".to_string(),
            },
            Label {
                post_id: "p1".to_string(),
                label: "release".to_string(),
            },
        ];

        let ranked = attach_labels(page, labels);
        assert_eq!(ranked[0].labels.len(), 2);
        assert!(ranked[1].labels.is_empty());
    }
}
