//! Pure scoring functions for the ranking pipeline.
//!
//! Both scores normalize a post's raw score by its source's rolling
//! average, so a busy source does not drown out a quiet one. Posts that
//! cannot be scored safely are excluded from ranking rather than clamped.

/// Source-normalized score with no time decay: `score / score_avg`.
///
/// Returns `None` when `score_avg` is not strictly positive, which
/// excludes the post from ranked output.
pub fn strength(score: f64, score_avg: f64) -> Option<f64> {
    if score_avg <= 0.0 {
        return None;
    }
    Some(score / score_avg)
}

/// Time-decayed trending score:
/// `log10(score / score_avg) - (now - created_at) / decay_seconds`.
///
/// The score ratio must be strictly positive before taking the
/// logarithm; non-positive ratios exclude the post.
pub fn trending(
    score: f64,
    score_avg: f64,
    created_at: i64,
    now: i64,
    decay_seconds: f64,
) -> Option<f64> {
    if score_avg <= 0.0 {
        return None;
    }
    let ratio = score / score_avg;
    if ratio <= 0.0 {
        return None;
    }
    Some(ratio.log10() - (now - created_at) as f64 / decay_seconds)
}
