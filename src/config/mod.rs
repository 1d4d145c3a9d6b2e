use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Tunables for the ranking pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Decay window for trending scores, in seconds.
    #[serde(default = "default_decay_seconds")]
    pub decay_seconds: f64,
    /// Candidate age window for trending, in hours.
    #[serde(default = "default_trending_age_hours")]
    pub trending_age_hours: i64,
    /// Minimum raw score for a post to be a trending candidate.
    #[serde(default = "default_trending_min_score")]
    pub trending_min_score: f64,
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
    #[serde(default = "default_top_age_hours")]
    pub top_default_age_hours: i64,
    #[serde(default = "default_top_max_age_hours")]
    pub top_max_age_hours: i64,
    #[serde(default = "default_top_limit")]
    pub top_default_limit: usize,
    #[serde(default = "default_labels_limit")]
    pub labels_default_limit: usize,
    #[serde(default = "default_labels_max_limit")]
    pub labels_max_limit: usize,
    #[serde(default = "default_announcements_age_hours")]
    pub announcements_default_age_hours: i64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            decay_seconds: default_decay_seconds(),
            trending_age_hours: default_trending_age_hours(),
            trending_min_score: default_trending_min_score(),
            trending_limit: default_trending_limit(),
            top_default_age_hours: default_top_age_hours(),
            top_max_age_hours: default_top_max_age_hours(),
            top_default_limit: default_top_limit(),
            labels_default_limit: default_labels_limit(),
            labels_max_limit: default_labels_max_limit(),
            announcements_default_age_hours: default_announcements_age_hours(),
        }
    }
}

impl RankingConfig {
    /// Effective page size for label searches, clamped to the maximum.
    pub fn effective_label_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.labels_default_limit)
            .min(self.labels_max_limit)
    }

    /// Effective age window for top rankings, clamped to 0..=max.
    pub fn effective_top_age(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.top_default_age_hours)
            .clamp(0, self.top_max_age_hours)
    }

    /// Effective age window for announcements. No upper bound, but
    /// negative ages clamp to 0 (an empty window, not an error).
    pub fn effective_announcements_age(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.announcements_default_age_hours)
            .max(0)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            ranking: RankingConfig {
                decay_seconds: env_or("RANKING_DECAY_SECONDS", default_decay_seconds)?,
                trending_age_hours: env_or("TRENDING_AGE_HOURS", default_trending_age_hours)?,
                trending_min_score: env_or("TRENDING_MIN_SCORE", default_trending_min_score)?,
                trending_limit: env_or("TRENDING_LIMIT", default_trending_limit)?,
                top_default_age_hours: env_or("TOP_DEFAULT_AGE_HOURS", default_top_age_hours)?,
                top_max_age_hours: env_or("TOP_MAX_AGE_HOURS", default_top_max_age_hours)?,
                top_default_limit: env_or("TOP_DEFAULT_LIMIT", default_top_limit)?,
                labels_default_limit: env_or("LABELS_DEFAULT_LIMIT", default_labels_limit)?,
                labels_max_limit: env_or("LABELS_MAX_LIMIT", default_labels_max_limit)?,
                announcements_default_age_hours: env_or(
                    "ANNOUNCEMENTS_DEFAULT_AGE_HOURS",
                    default_announcements_age_hours,
                )?,
            },
        })
    }
}

fn env_or<T>(key: &str, default: fn() -> T) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + 'static,
{
    match std::env::var(key) {
        Ok(raw) => Ok(raw.parse()?),
        Err(_) => Ok(default()),
    }
}

fn default_decay_seconds() -> f64 {
    90000.0
}

fn default_trending_age_hours() -> i64 {
    72
}

fn default_trending_min_score() -> f64 {
    4.0
}

fn default_trending_limit() -> usize {
    100
}

fn default_top_age_hours() -> i64 {
    168
}

fn default_top_max_age_hours() -> i64 {
    720
}

fn default_top_limit() -> usize {
    5
}

fn default_labels_limit() -> usize {
    50
}

fn default_labels_max_limit() -> usize {
    100
}

fn default_announcements_age_hours() -> i64 {
    336
}
