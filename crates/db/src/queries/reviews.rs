use crate::models::{Review, ReviewStats};
use sqlx::{PgPool, Postgres, Transaction};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

const SORTABLE_COLUMNS: &[&str] = &["created_at", "rating", "updated_at"];

pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub fn sort_column(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|name| SORTABLE_COLUMNS.iter().find(|&&col| col == name))
        .copied()
        .unwrap_or("created_at")
}

#[derive(Debug)]
pub struct ReviewUpsert<'a> {
    pub channel_id: i64,
    pub user_telegram_id: i64,
    pub user_username: Option<&'a str>,
    pub user_first_name: Option<&'a str>,
    pub rating: i32,
    pub comment: Option<&'a str>,
}

#[derive(Debug)]
pub struct UpsertedReview {
    pub review: Review,
    pub created: bool,
}

/// Insert or update the caller's review, then recompute the owning channel's
/// rating aggregates before committing. One review per (channel, user).
pub async fn upsert(
    pool: &PgPool,
    input: &ReviewUpsert<'_>,
) -> Result<UpsertedReview, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM reviews WHERE channel_id = $1 AND user_telegram_id = $2",
    )
    .bind(input.channel_id)
    .bind(input.user_telegram_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (review, created) = if existing.is_some() {
        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews SET
                rating = $1,
                comment = $2,
                user_username = $3,
                user_first_name = $4,
                updated_at = now()
            WHERE channel_id = $5 AND user_telegram_id = $6
            RETURNING *
            "#,
        )
        .bind(input.rating)
        .bind(input.comment)
        .bind(input.user_username)
        .bind(input.user_first_name)
        .bind(input.channel_id)
        .bind(input.user_telegram_id)
        .fetch_one(&mut *tx)
        .await?;
        (review, false)
    } else {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews
                (channel_id, user_telegram_id, user_username, user_first_name, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.channel_id)
        .bind(input.user_telegram_id)
        .bind(input.user_username)
        .bind(input.user_first_name)
        .bind(input.rating)
        .bind(input.comment)
        .fetch_one(&mut *tx)
        .await?;
        (review, true)
    };

    recompute_channel_rating(&mut tx, input.channel_id).await?;
    tx.commit().await?;

    Ok(UpsertedReview { review, created })
}

/// Delete a review if the caller authored it, then recompute the channel's
/// aggregates. Returns `None` when no row matched (wrong id or wrong author).
pub async fn delete(
    pool: &PgPool,
    review_id: i64,
    user_telegram_id: i64,
) -> Result<Option<Review>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query_as::<_, Review>(
        "DELETE FROM reviews WHERE id = $1 AND user_telegram_id = $2 RETURNING *",
    )
    .bind(review_id)
    .bind(user_telegram_id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some(review) = &deleted {
        recompute_channel_rating(&mut tx, review.channel_id).await?;
    }
    tx.commit().await?;

    Ok(deleted)
}

/// Keep `channels.rating_*` equal to the aggregate of its reviews. Runs in
/// the same transaction as the review write; reviews with a non-empty
/// comment count toward `reviews_count`.
async fn recompute_channel_rating(
    tx: &mut Transaction<'_, Postgres>,
    channel_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE channels SET
            rating_average = COALESCE(
                (SELECT ROUND(AVG(rating)::numeric, 2)::float8
                 FROM reviews WHERE channel_id = $1),
                0
            ),
            rating_count = (SELECT COUNT(*) FROM reviews WHERE channel_id = $1),
            reviews_count = (
                SELECT COUNT(*) FROM reviews
                WHERE channel_id = $1 AND comment IS NOT NULL AND comment <> ''
            )
        WHERE channel_id = $1
        "#,
    )
    .bind(channel_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn list_for_channel(
    pool: &PgPool,
    channel_id: i64,
    sort_column: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Review>, i64), sqlx::Error> {
    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE channel_id = $1")
            .bind(channel_id)
            .fetch_one(pool)
            .await?;

    // Identifiers come from allow-lists.
    let query = format!(
        "SELECT * FROM reviews WHERE channel_id = $1 ORDER BY {} {} LIMIT $2 OFFSET $3",
        sort_column, sort_order
    );
    let reviews = sqlx::query_as::<_, Review>(&query)
        .bind(channel_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((reviews, total))
}

pub async fn stats_for_channel(
    pool: &PgPool,
    channel_id: i64,
) -> Result<ReviewStats, sqlx::Error> {
    sqlx::query_as::<_, ReviewStats>(
        r#"
        SELECT
            COUNT(*) AS total_reviews,
            COALESCE(ROUND(AVG(rating)::numeric, 2)::float8, 0) AS avg_rating,
            COUNT(*) FILTER (WHERE rating = 5) AS five_stars,
            COUNT(*) FILTER (WHERE rating = 4) AS four_stars,
            COUNT(*) FILTER (WHERE rating = 3) AS three_stars,
            COUNT(*) FILTER (WHERE rating = 2) AS two_stars,
            COUNT(*) FILTER (WHERE rating = 1) AS one_star
        FROM reviews
        WHERE channel_id = $1
        "#,
    )
    .bind(channel_id)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(1000)), MAX_LIMIT);
        assert_eq!(clamp_limit(Some(10)), 10);
    }

    #[test]
    fn test_sort_column_allow_list() {
        assert_eq!(sort_column(Some("rating")), "rating");
        assert_eq!(sort_column(Some("updated_at")), "updated_at");
        assert_eq!(sort_column(Some("comment")), "created_at");
        assert_eq!(sort_column(None), "created_at");
    }
}
