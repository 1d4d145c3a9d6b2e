/// Post Ranking API Handlers
///
/// HTTP endpoints for the ranked, deduplicated post views
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::services::ranking::RankingService;

/// Parsed parameters for GET /labels. The `label` parameter may repeat,
/// so the raw query pairs are parsed by hand rather than through a
/// derive struct.
#[derive(Debug, Default, PartialEq)]
pub struct LabelQuery {
    pub labels: Vec<String>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl LabelQuery {
    fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let mut query = LabelQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "label" => query.labels.push(value.clone()),
                "offset" => {
                    query.offset = value.parse().map_err(|_| {
                        AppError::InvalidRequest(format!("invalid offset: {}", value))
                    })?
                }
                "limit" => {
                    query.limit = Some(value.parse().map_err(|_| {
                        AppError::InvalidRequest(format!("invalid limit: {}", value))
                    })?)
                }
                _ => {}
            }
        }
        Ok(query)
    }
}

/// Query parameters for the age-windowed endpoints
#[derive(Debug, Deserialize)]
pub struct AgeQuery {
    /// Maximum age of a post, in hours
    pub age: Option<i64>,
}

/// GET /labels?label=...&label=...&offset=&limit=
///
/// Posts carrying at least one requested label, ranked by strength.
#[get("/labels")]
pub async fn get_label_posts(
    raw: web::Query<Vec<(String, String)>>,
    service: web::Data<RankingService>,
) -> Result<HttpResponse> {
    let query = LabelQuery::from_pairs(&raw)?;
    debug!(
        labels = ?query.labels,
        offset = query.offset,
        "Label ranking request"
    );

    let posts = service
        .rank_by_labels(&query.labels, query.offset, query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(&*posts))
}

/// GET /trending
///
/// Recent posts ranked by time-decayed trending score.
#[get("/trending")]
pub async fn get_trending_posts(service: web::Data<RankingService>) -> Result<HttpResponse> {
    let posts = service.rank_trending().await?;
    Ok(HttpResponse::Ok().json(&*posts))
}

/// GET /top?age=
///
/// Posts within an age window ranked by strength, no decay.
#[get("/top")]
pub async fn get_top_posts(
    query: web::Query<AgeQuery>,
    service: web::Data<RankingService>,
) -> Result<HttpResponse> {
    let posts = service.rank_top(query.age).await?;
    Ok(HttpResponse::Ok().json(&*posts))
}

/// GET /announcements?age=
///
/// Newest-first feed from the announcement channels.
#[get("/announcements")]
pub async fn get_announcement_posts(
    query: web::Query<AgeQuery>,
    service: web::Data<RankingService>,
) -> Result<HttpResponse> {
    let posts = service.rank_announcements(query.age).await?;
    Ok(HttpResponse::Ok().json(&*posts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_repeated_label_params() {
        let query =
            LabelQuery::from_pairs(&pairs(&[("label", "nano"), ("label", "release")])).unwrap();
        assert_eq!(query.labels, vec!["nano", "release"]);
        assert_eq!(query.offset, 0);
        assert_eq!(query.limit, None);
    }

    #[test]
    fn parses_offset_and_limit() {
        let query = LabelQuery::from_pairs(&pairs(&[
            ("label", "nano"),
            ("offset", "10"),
            ("limit", "25"),
        ]))
        .unwrap();
        assert_eq!(query.offset, 10);
        assert_eq!(query.limit, Some(25));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(LabelQuery::from_pairs(&pairs(&[("offset", "ten")])).is_err());
        assert!(LabelQuery::from_pairs(&pairs(&[("limit", "-1")])).is_err());
    }

    #[test]
    fn ignores_unknown_params() {
        let query = LabelQuery::from_pairs(&pairs(&[("label", "nano"), ("foo", "bar")])).unwrap();
        assert_eq!(query.labels, vec!["nano"]);
    }
}
