use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};
use zonix_db::models::Category;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/categories", get(list_categories))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct CategoriesResponse {
    success: bool,
    categories: Vec<Category>,
}

async fn list_categories(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<CategoriesResponse>> {
    let categories = zonix_db::queries::categories::list(&state.db)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(CategoriesResponse {
        success: true,
        categories,
    }))
}
