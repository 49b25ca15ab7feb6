use crate::models::Category;
use sqlx::PgPool;

pub async fn list(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, emoji, description
        FROM categories
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
}
