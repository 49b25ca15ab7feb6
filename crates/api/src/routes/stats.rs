use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};
use zonix_db::models::CatalogStats;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/stats", get(catalog_stats))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    success: bool,
    stats: CatalogStats,
}

async fn catalog_stats(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<StatsResponse>> {
    let stats = zonix_db::queries::channels::catalog_stats(&state.db)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
