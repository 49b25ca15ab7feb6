use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiResult, AppError},
    state::{AppState, RequestId},
};
use zonix_db::models::{Review, ReviewStats};
use zonix_db::queries::{channels as channel_queries, reviews as review_queries};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/reviews", post(upsert_review))
        .route("/api/reviews/{id}", delete(delete_review))
        .route("/api/channels/{id}/reviews", get(list_reviews))
        .route("/api/channels/{id}/reviews/stats", get(review_stats))
        .with_state(state)
}

fn rating_valid(rating: i32) -> bool {
    (1..=5).contains(&rating)
}

#[derive(Debug, Deserialize)]
struct UpsertReviewRequest {
    channel_id: i64,
    user_telegram_id: i64,
    user_username: Option<String>,
    user_first_name: Option<String>,
    rating: i32,
    comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpsertReviewResponse {
    success: bool,
    action: &'static str,
    review: Review,
}

async fn upsert_review(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<UpsertReviewRequest>,
) -> ApiResult<Json<UpsertReviewResponse>> {
    if !rating_valid(payload.rating) {
        return Err(
            AppError::BadRequest("rating must be between 1 and 5".to_string())
                .with_request_id(&request_id.0),
        );
    }

    let channel = channel_queries::get_by_channel_id(&state.db, payload.channel_id)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;
    if channel.is_none() {
        return Err(AppError::NotFound("channel not found".to_string())
            .with_request_id(&request_id.0));
    }

    let input = review_queries::ReviewUpsert {
        channel_id: payload.channel_id,
        user_telegram_id: payload.user_telegram_id,
        user_username: payload.user_username.as_deref(),
        user_first_name: payload.user_first_name.as_deref(),
        rating: payload.rating,
        comment: payload.comment.as_deref(),
    };

    let upserted = review_queries::upsert(&state.db, &input)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(UpsertReviewResponse {
        success: true,
        action: if upserted.created { "created" } else { "updated" },
        review: upserted.review,
    }))
}

#[derive(Debug, Deserialize)]
struct DeleteReviewRequest {
    user_telegram_id: i64,
}

#[derive(Debug, Serialize)]
struct DeleteReviewResponse {
    success: bool,
    message: &'static str,
    review: Review,
}

async fn delete_review(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(payload): Json<DeleteReviewRequest>,
) -> ApiResult<Json<DeleteReviewResponse>> {
    let review = review_queries::delete(&state.db, id, payload.user_telegram_id)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?
        .ok_or_else(|| {
            AppError::NotFound("review not found or not the author".to_string())
                .with_request_id(&request_id.0)
        })?;

    Ok(Json(DeleteReviewResponse {
        success: true,
        message: "Review removed",
        review,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListReviewsQuery {
    sort_by: Option<String>,
    order: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ReviewListResponse {
    success: bool,
    reviews: Vec<Review>,
    total: i64,
}

async fn list_reviews(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Query(query): Query<ListReviewsQuery>,
) -> ApiResult<Json<ReviewListResponse>> {
    let sort_column = review_queries::sort_column(query.sort_by.as_deref());
    let sort_order = channel_queries::sort_order(query.order.as_deref());
    let limit = review_queries::clamp_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);

    let (reviews, total) =
        review_queries::list_for_channel(&state.db, id, sort_column, sort_order, limit, offset)
            .await
            .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(ReviewListResponse {
        success: true,
        reviews,
        total,
    }))
}

#[derive(Debug, Serialize)]
struct ReviewStatsResponse {
    success: bool,
    stats: ReviewStats,
}

async fn review_stats(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ReviewStatsResponse>> {
    let stats = review_queries::stats_for_channel(&state.db, id)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(ReviewStatsResponse {
        success: true,
        stats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(!rating_valid(0));
        assert!(rating_valid(1));
        assert!(rating_valid(5));
        assert!(!rating_valid(6));
        assert!(!rating_valid(-1));
    }
}
