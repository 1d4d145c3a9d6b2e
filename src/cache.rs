//! In-process caching layer for ranked result sets
//!
//! Cache keys follow the pattern:
//! - labels_{sorted labels joined by "-"} → label search results
//! - trending → trending ranking
//! - top_{age_hours} → top ranking for an age window
//! - announcements{age_hours} → announcement feed for an age window
//!
//! Entries have no expiry: freshness is maintained by the refresh
//! scheduler and by lazy population on first miss. A `set` replaces the
//! entry wholesale; concurrent writers race with last-writer-wins, which
//! is acceptable since both represent a recently computed ranking.

use crate::models::RankedPost;
use dashmap::DashMap;
use std::sync::Arc;

/// Process-wide ranking cache.
///
/// Values are handed out as `Arc` clones; callers receive an immutable
/// view and must never observe in-place mutation. Label attachment
/// happens before insertion, so cached entries are complete.
#[derive(Clone, Default)]
pub struct RankingCache {
    entries: Arc<DashMap<String, Arc<Vec<RankedPost>>>>,
}

impl RankingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<RankedPost>>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Store a result set, replacing any previous entry for the key.
    /// Returns the shared handle so the caller can serve it directly.
    pub fn set(&self, key: impl Into<String>, value: Vec<RankedPost>) -> Arc<Vec<RankedPost>> {
        let value = Arc::new(value);
        self.entries.insert(key.into(), Arc::clone(&value));
        value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub const TRENDING_KEY: &str = "trending";

/// Key for a label search. Labels are sorted with a plain string sort so
/// that the same set always derives the same key regardless of request
/// order; non-numeric labels sort correctly too.
pub fn labels_key(labels: &[String]) -> String {
    let mut sorted: Vec<&str> = labels.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("labels_{}", sorted.join("-"))
}

pub fn top_key(age_hours: i64) -> String {
    format!("top_{}", age_hours)
}

pub fn announcements_key(age_hours: i64) -> String {
    format!("announcements{}", age_hours)
}
