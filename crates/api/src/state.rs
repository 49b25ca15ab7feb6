use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Shared secret for bot-only endpoints.
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);
