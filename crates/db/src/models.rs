use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    pub id: i64,
    pub channel_id: i64,
    pub title: String,
    pub username: Option<String>,
    pub description: Option<String>,
    pub subscribers_count: i32,
    pub photo_url: Option<String>,
    pub categories: Vec<String>,
    pub thematic_tags: Vec<String>,
    pub format_tags: Vec<String>,
    pub owner_telegram_id: Option<i64>,
    pub owner_username: Option<String>,
    pub rating_average: f64,
    pub rating_count: i32,
    pub reviews_count: i32,
    pub is_published: bool,
    pub is_verified: bool,
    pub bot_is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub channel_id: i64,
    pub user_telegram_id: i64,
    pub user_username: Option<String>,
    pub user_first_name: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
}

/// Per-channel review histogram.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewStats {
    pub total_reviews: i64,
    pub avg_rating: f64,
    pub five_stars: i64,
    pub four_stars: i64,
    pub three_stars: i64,
    pub two_stars: i64,
    pub one_star: i64,
}

/// Catalog-wide totals for `GET /api/stats`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CatalogStats {
    pub total_channels: i64,
    pub active_channels: i64,
    pub published_channels: i64,
    pub total_subscribers: i64,
    pub last_update: Option<DateTime<Utc>>,
}
