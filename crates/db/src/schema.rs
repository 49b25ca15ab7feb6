//! Schema bootstrap. Tables are created on API startup; the category
//! reference table is seeded from the static catalog.
//!
//! Rating aggregates on `channels` are maintained by the application inside
//! the review transactions (see `queries::reviews`), not by a trigger.

use sqlx::PgPool;
use zonix_core::catalog;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS channels (
    id BIGSERIAL PRIMARY KEY,
    channel_id BIGINT UNIQUE NOT NULL,
    title VARCHAR(255) NOT NULL,
    username VARCHAR(255),
    description TEXT,
    subscribers_count INTEGER NOT NULL DEFAULT 0,
    photo_url TEXT,
    categories TEXT[] NOT NULL DEFAULT '{}',
    thematic_tags TEXT[] NOT NULL DEFAULT '{}',
    format_tags TEXT[] NOT NULL DEFAULT '{}',
    owner_telegram_id BIGINT,
    owner_username VARCHAR(255),
    rating_average DOUBLE PRECISION NOT NULL DEFAULT 0,
    rating_count INTEGER NOT NULL DEFAULT 0,
    reviews_count INTEGER NOT NULL DEFAULT 0,
    is_published BOOLEAN NOT NULL DEFAULT FALSE,
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    bot_is_admin BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_update TIMESTAMPTZ NOT NULL DEFAULT now(),
    published_at TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS reviews (
    id BIGSERIAL PRIMARY KEY,
    channel_id BIGINT NOT NULL,
    user_telegram_id BIGINT NOT NULL,
    user_username VARCHAR(255),
    user_first_name VARCHAR(255),
    rating INTEGER NOT NULL CHECK (rating >= 1 AND rating <= 5),
    comment TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (channel_id, user_telegram_id)
);

CREATE TABLE IF NOT EXISTS categories (
    id SERIAL PRIMARY KEY,
    name VARCHAR(100) UNIQUE NOT NULL,
    emoji VARCHAR(10),
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_channels_subscribers ON channels (subscribers_count);
CREATE INDEX IF NOT EXISTS idx_channels_published ON channels (is_published);
CREATE INDEX IF NOT EXISTS idx_channels_rating ON channels (rating_average);
CREATE INDEX IF NOT EXISTS idx_channels_owner ON channels (owner_telegram_id);
CREATE INDEX IF NOT EXISTS idx_reviews_channel ON reviews (channel_id);
CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews (user_telegram_id);
"#;

pub async fn init(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(CREATE_TABLES).execute(pool).await?;
    seed_categories(pool).await?;
    Ok(())
}

async fn seed_categories(pool: &PgPool) -> Result<(), sqlx::Error> {
    for cat in catalog::CATEGORIES {
        sqlx::query(
            r#"
            INSERT INTO categories (name, emoji, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(cat.name)
        .bind(cat.emoji)
        .bind(cat.description)
        .execute(pool)
        .await?;
    }
    Ok(())
}
