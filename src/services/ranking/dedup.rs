//! Deduplication of cross-posted content.
//!
//! Many ingested posts reference the same canonical content. The scored
//! candidate set is collapsed to one representative per main URL before
//! any offset/limit truncation, so pagination operates on distinct
//! content rather than raw rows.

use crate::models::PostRow;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A candidate row with its computed ranking score.
#[derive(Debug, Clone)]
pub struct ScoredPost {
    pub row: PostRow,
    pub strength: f64,
}

/// Collapse candidates sharing a main URL to the highest-scoring
/// representative (ties broken by lowest post id) and return the
/// survivors sorted descending by score, ascending by id.
pub fn collapse_by_main_url(candidates: Vec<ScoredPost>) -> Vec<ScoredPost> {
    let mut best: HashMap<String, ScoredPost> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        let key = candidate.row.main_url().to_string();
        match best.get(&key) {
            Some(current) if !beats(&candidate, current) => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }

    let mut survivors: Vec<ScoredPost> = best.into_values().collect();
    survivors.sort_by(compare_rank);
    survivors
}

fn beats(challenger: &ScoredPost, current: &ScoredPost) -> bool {
    match challenger
        .strength
        .partial_cmp(&current.strength)
        .unwrap_or(Ordering::Equal)
    {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => challenger.row.id < current.row.id,
    }
}

fn compare_rank(a: &ScoredPost, b: &ScoredPost) -> Ordering {
    b.strength
        .partial_cmp(&a.strength)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.row.id.cmp(&b.row.id))
}
