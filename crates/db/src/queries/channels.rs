use crate::models::{CatalogStats, Channel};
use sqlx::{PgPool, Postgres, QueryBuilder};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

const SORTABLE_COLUMNS: &[&str] = &[
    "subscribers_count",
    "title",
    "last_update",
    "created_at",
    "rating_average",
];

/// Clamp a requested page size to the allowed window.
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Resolve a sort column against the allow-list; anything else falls back to
/// subscriber count.
pub fn sort_column(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|name| SORTABLE_COLUMNS.iter().find(|&&col| col == name))
        .copied()
        .unwrap_or("subscribers_count")
}

pub fn sort_order(requested: Option<&str>) -> &'static str {
    match requested {
        Some(order) if order.eq_ignore_ascii_case("asc") => "ASC",
        _ => "DESC",
    }
}

#[derive(Debug, Default)]
pub struct ChannelFilter<'a> {
    pub published: Option<bool>,
    pub category: Option<&'a str>,
    pub search: Option<&'a str>,
    pub min_subscribers: Option<i32>,
    pub max_subscribers: Option<i32>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ChannelFilter<'_>) {
    qb.push(" WHERE 1=1");
    if let Some(published) = filter.published {
        qb.push(" AND is_published = ").push_bind(published);
    }
    if let Some(category) = filter.category {
        qb.push(" AND ")
            .push_bind(category.to_string())
            .push(" = ANY(categories)");
    }
    if let Some(search) = filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR username ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(min) = filter.min_subscribers {
        qb.push(" AND subscribers_count >= ").push_bind(min);
    }
    if let Some(max) = filter.max_subscribers {
        qb.push(" AND subscribers_count <= ").push_bind(max);
    }
}

pub async fn list(
    pool: &PgPool,
    filter: &ChannelFilter<'_>,
    sort_column: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Channel>, i64), sqlx::Error> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM channels");
    push_filters(&mut count_qb, filter);
    let (total,): (i64,) = count_qb.build_query_as().fetch_one(pool).await?;

    let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM channels");
    push_filters(&mut qb, filter);
    // Both identifiers come from allow-lists, never from user input.
    qb.push(format!(" ORDER BY {} {}", sort_column, sort_order));
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    let channels = qb.build_query_as::<Channel>().fetch_all(pool).await?;
    Ok((channels, total))
}

pub async fn get_by_channel_id(
    pool: &PgPool,
    channel_id: i64,
) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE channel_id = $1")
        .bind(channel_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_owner(
    pool: &PgPool,
    owner_telegram_id: i64,
) -> Result<Vec<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>(
        "SELECT * FROM channels WHERE owner_telegram_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_telegram_id)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>("SELECT * FROM channels ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn delete_by_channel_id(
    pool: &PgPool,
    channel_id: i64,
) -> Result<Option<Channel>, sqlx::Error> {
    sqlx::query_as::<_, Channel>("DELETE FROM channels WHERE channel_id = $1 RETURNING *")
        .bind(channel_id)
        .fetch_optional(pool)
        .await
}

#[derive(Debug)]
pub struct Upserted {
    pub channel: Channel,
    pub created: bool,
}

/// Full upsert used by the publish path. Lookup-then-write by external
/// channel id; concurrent first-writes for the same id are not guarded.
#[derive(Debug)]
pub struct ChannelUpsert<'a> {
    pub channel_id: i64,
    pub title: &'a str,
    pub username: Option<&'a str>,
    pub description: Option<&'a str>,
    pub subscribers_count: i32,
    pub photo_url: Option<&'a str>,
    pub categories: &'a [String],
    pub thematic_tags: &'a [String],
    pub format_tags: &'a [String],
    pub owner_telegram_id: Option<i64>,
    pub owner_username: Option<&'a str>,
    pub is_published: bool,
}

pub async fn upsert_stats(
    pool: &PgPool,
    input: &ChannelUpsert<'_>,
) -> Result<Upserted, sqlx::Error> {
    let existing = get_by_channel_id(pool, input.channel_id).await?;

    if existing.is_some() {
        let channel = sqlx::query_as::<_, Channel>(
            r#"
            UPDATE channels SET
                title = $1,
                username = $2,
                description = $3,
                subscribers_count = $4,
                photo_url = $5,
                categories = $6,
                thematic_tags = $7,
                format_tags = $8,
                owner_telegram_id = COALESCE($9, owner_telegram_id),
                owner_username = COALESCE($10, owner_username),
                is_published = $11,
                bot_is_admin = TRUE,
                published_at = CASE
                    WHEN $11 AND published_at IS NULL THEN now()
                    ELSE published_at
                END,
                last_update = now()
            WHERE channel_id = $12
            RETURNING *
            "#,
        )
        .bind(input.title)
        .bind(input.username)
        .bind(input.description)
        .bind(input.subscribers_count)
        .bind(input.photo_url)
        .bind(input.categories)
        .bind(input.thematic_tags)
        .bind(input.format_tags)
        .bind(input.owner_telegram_id)
        .bind(input.owner_username)
        .bind(input.is_published)
        .bind(input.channel_id)
        .fetch_one(pool)
        .await?;

        Ok(Upserted {
            channel,
            created: false,
        })
    } else {
        let channel = sqlx::query_as::<_, Channel>(
            r#"
            INSERT INTO channels
                (channel_id, title, username, description, subscribers_count, photo_url,
                 categories, thematic_tags, format_tags, owner_telegram_id, owner_username,
                 is_published, bot_is_admin, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, TRUE,
                    CASE WHEN $12 THEN now() ELSE NULL END)
            RETURNING *
            "#,
        )
        .bind(input.channel_id)
        .bind(input.title)
        .bind(input.username)
        .bind(input.description)
        .bind(input.subscribers_count)
        .bind(input.photo_url)
        .bind(input.categories)
        .bind(input.thematic_tags)
        .bind(input.format_tags)
        .bind(input.owner_telegram_id)
        .bind(input.owner_username)
        .bind(input.is_published)
        .fetch_one(pool)
        .await?;

        Ok(Upserted {
            channel,
            created: true,
        })
    }
}

/// Draft upsert used by the stats collector. The update path refreshes only
/// transport-derived fields so wizard-produced data survives periodic pushes.
#[derive(Debug)]
pub struct ChannelDraft<'a> {
    pub channel_id: i64,
    pub title: &'a str,
    pub username: Option<&'a str>,
    pub subscribers_count: i32,
    pub photo_url: Option<&'a str>,
    pub owner_telegram_id: Option<i64>,
    pub is_published: bool,
}

pub async fn save(pool: &PgPool, input: &ChannelDraft<'_>) -> Result<Upserted, sqlx::Error> {
    let existing = get_by_channel_id(pool, input.channel_id).await?;

    if existing.is_some() {
        let channel = sqlx::query_as::<_, Channel>(
            r#"
            UPDATE channels SET
                title = $1,
                username = $2,
                subscribers_count = $3,
                photo_url = $4,
                last_update = now()
            WHERE channel_id = $5
            RETURNING *
            "#,
        )
        .bind(input.title)
        .bind(input.username)
        .bind(input.subscribers_count)
        .bind(input.photo_url)
        .bind(input.channel_id)
        .fetch_one(pool)
        .await?;

        Ok(Upserted {
            channel,
            created: false,
        })
    } else {
        let channel = sqlx::query_as::<_, Channel>(
            r#"
            INSERT INTO channels
                (channel_id, title, username, subscribers_count, photo_url,
                 owner_telegram_id, is_published, bot_is_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING *
            "#,
        )
        .bind(input.channel_id)
        .bind(input.title)
        .bind(input.username)
        .bind(input.subscribers_count)
        .bind(input.photo_url)
        .bind(input.owner_telegram_id)
        .bind(input.is_published)
        .fetch_one(pool)
        .await?;

        Ok(Upserted {
            channel,
            created: true,
        })
    }
}

pub async fn catalog_stats(pool: &PgPool) -> Result<CatalogStats, sqlx::Error> {
    sqlx::query_as::<_, CatalogStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM channels) AS total_channels,
            (SELECT COUNT(*) FROM channels WHERE bot_is_admin) AS active_channels,
            (SELECT COUNT(*) FROM channels WHERE is_published) AS published_channels,
            (SELECT COALESCE(SUM(subscribers_count), 0) FROM channels WHERE bot_is_admin)
                AS total_subscribers,
            (SELECT MAX(last_update) FROM channels) AS last_update
        "#,
    )
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit_default() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
    }

    #[test]
    fn test_clamp_limit_caps_oversized_requests() {
        assert_eq!(clamp_limit(Some(500)), MAX_LIMIT);
    }

    #[test]
    fn test_clamp_limit_floors_at_one() {
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
    }

    #[test]
    fn test_clamp_limit_passes_through_valid_values() {
        assert_eq!(clamp_limit(Some(25)), 25);
        assert_eq!(clamp_limit(Some(MAX_LIMIT)), MAX_LIMIT);
    }

    #[test]
    fn test_sort_column_allow_list() {
        assert_eq!(sort_column(Some("rating_average")), "rating_average");
        assert_eq!(sort_column(Some("title")), "title");
    }

    #[test]
    fn test_sort_column_rejects_unknown_columns() {
        assert_eq!(sort_column(Some("owner_telegram_id")), "subscribers_count");
        assert_eq!(sort_column(Some("; DROP TABLE channels")), "subscribers_count");
        assert_eq!(sort_column(None), "subscribers_count");
    }

    #[test]
    fn test_sort_order_normalization() {
        assert_eq!(sort_order(Some("asc")), "ASC");
        assert_eq!(sort_order(Some("ASC")), "ASC");
        assert_eq!(sort_order(Some("desc")), "DESC");
        assert_eq!(sort_order(Some("sideways")), "DESC");
        assert_eq!(sort_order(None), "DESC");
    }
}
