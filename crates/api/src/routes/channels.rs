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
use zonix_core::catalog;
use zonix_db::models::Channel;
use zonix_db::queries::channels as channel_queries;

pub fn open_router(state: AppState) -> Router {
    Router::new()
        .route("/api/channels", get(list_channels))
        .route("/api/channels/{id}", get(get_channel))
        .with_state(state)
}

pub fn protected_router(state: AppState) -> Router {
    Router::new()
        .route("/api/channels/update-stats", post(update_stats))
        .route("/api/channels/save", post(save_channel))
        .route("/api/channels/user/{user_id}", get(channels_for_owner))
        .route("/api/channels/all", get(list_all_channels))
        .route("/api/channels/{id}", delete(delete_channel))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListChannelsQuery {
    published: Option<bool>,
    category: Option<String>,
    search: Option<String>,
    min_subscribers: Option<i32>,
    max_subscribers: Option<i32>,
    sort_by: Option<String>,
    order: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ChannelListResponse {
    success: bool,
    channels: Vec<Channel>,
    total: i64,
    page: i64,
    total_pages: i64,
    limit: i64,
}

async fn list_channels(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<ListChannelsQuery>,
) -> ApiResult<Json<ChannelListResponse>> {
    let filter = channel_queries::ChannelFilter {
        published: query.published,
        category: query.category.as_deref(),
        search: query.search.as_deref(),
        min_subscribers: query.min_subscribers,
        max_subscribers: query.max_subscribers,
    };
    let sort_column = channel_queries::sort_column(query.sort_by.as_deref());
    let sort_order = channel_queries::sort_order(query.order.as_deref());
    let limit = channel_queries::clamp_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);

    let (channels, total) =
        channel_queries::list(&state.db, &filter, sort_column, sort_order, limit, offset)
            .await
            .map_err(|err| AppError::internal(err, &request_id.0))?;

    let (page, total_pages) = page_numbers(total, limit, offset);

    Ok(Json(ChannelListResponse {
        success: true,
        channels,
        total,
        page,
        total_pages,
        limit,
    }))
}

fn page_numbers(total: i64, limit: i64, offset: i64) -> (i64, i64) {
    (offset / limit + 1, (total + limit - 1) / limit)
}

#[derive(Debug, Serialize)]
struct ChannelResponse {
    success: bool,
    channel: Channel,
}

async fn get_channel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ChannelResponse>> {
    let channel = channel_queries::get_by_channel_id(&state.db, id)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?
        .ok_or_else(|| {
            AppError::NotFound("channel not found".to_string()).with_request_id(&request_id.0)
        })?;

    Ok(Json(ChannelResponse {
        success: true,
        channel,
    }))
}

#[derive(Debug, Deserialize)]
struct UpdateStatsRequest {
    channel_id: i64,
    title: String,
    username: Option<String>,
    description: Option<String>,
    subscribers_count: Option<i32>,
    photo_url: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    thematic_tags: Vec<String>,
    #[serde(default)]
    format_tags: Vec<String>,
    owner_telegram_id: Option<i64>,
    owner_username: Option<String>,
    is_published: Option<bool>,
}

/// API-side description ceiling. The wizard enforces a tighter bound; other
/// clients of this endpoint get the lenient one.
const DESCRIPTION_MAX_CHARS: usize = 500;

fn validate_update_stats(req: &UpdateStatsRequest) -> Result<(), String> {
    if req.title.trim().is_empty() {
        return Err("title is required".to_string());
    }
    if req.categories.is_empty() || req.categories.len() > catalog::MAX_CATEGORIES {
        return Err(format!(
            "between 1 and {} categories required",
            catalog::MAX_CATEGORIES
        ));
    }
    if req.thematic_tags.len() > catalog::MAX_THEMATIC_TAGS {
        return Err(format!(
            "at most {} thematic tags allowed",
            catalog::MAX_THEMATIC_TAGS
        ));
    }
    if req.format_tags.len() > catalog::MAX_FORMAT_TAGS {
        return Err(format!(
            "at most {} format tags allowed",
            catalog::MAX_FORMAT_TAGS
        ));
    }
    if let Some(description) = &req.description {
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(format!(
                "description exceeds {} characters",
                DESCRIPTION_MAX_CHARS
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct UpsertChannelResponse {
    success: bool,
    action: &'static str,
    channel: Channel,
}

async fn update_stats(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<UpdateStatsRequest>,
) -> ApiResult<Json<UpsertChannelResponse>> {
    validate_update_stats(&payload)
        .map_err(|msg| AppError::BadRequest(msg).with_request_id(&request_id.0))?;

    let input = channel_queries::ChannelUpsert {
        channel_id: payload.channel_id,
        title: &payload.title,
        username: payload.username.as_deref(),
        description: payload.description.as_deref(),
        subscribers_count: payload.subscribers_count.unwrap_or(0),
        photo_url: payload.photo_url.as_deref(),
        categories: &payload.categories,
        thematic_tags: &payload.thematic_tags,
        format_tags: &payload.format_tags,
        owner_telegram_id: payload.owner_telegram_id,
        owner_username: payload.owner_username.as_deref(),
        is_published: payload.is_published.unwrap_or(false),
    };

    let upserted = channel_queries::upsert_stats(&state.db, &input)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(UpsertChannelResponse {
        success: true,
        action: if upserted.created { "created" } else { "updated" },
        channel: upserted.channel,
    }))
}

#[derive(Debug, Deserialize)]
struct SaveChannelRequest {
    channel_id: i64,
    title: String,
    username: Option<String>,
    subscribers_count: Option<i32>,
    photo_url: Option<String>,
    owner_telegram_id: Option<i64>,
    is_published: Option<bool>,
}

async fn save_channel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<SaveChannelRequest>,
) -> ApiResult<Json<UpsertChannelResponse>> {
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest("title is required".to_string())
            .with_request_id(&request_id.0));
    }

    let input = channel_queries::ChannelDraft {
        channel_id: payload.channel_id,
        title: &payload.title,
        username: payload.username.as_deref(),
        subscribers_count: payload.subscribers_count.unwrap_or(0),
        photo_url: payload.photo_url.as_deref(),
        owner_telegram_id: payload.owner_telegram_id,
        is_published: payload.is_published.unwrap_or(false),
    };

    let upserted = channel_queries::save(&state.db, &input)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(UpsertChannelResponse {
        success: true,
        action: if upserted.created { "created" } else { "updated" },
        channel: upserted.channel,
    }))
}

#[derive(Debug, Serialize)]
struct ChannelsResponse {
    success: bool,
    channels: Vec<Channel>,
}

async fn channels_for_owner(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<ChannelsResponse>> {
    let channels = channel_queries::list_by_owner(&state.db, user_id)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(ChannelsResponse {
        success: true,
        channels,
    }))
}

async fn list_all_channels(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult<Json<ChannelsResponse>> {
    let channels = channel_queries::list_all(&state.db)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?;

    Ok(Json(ChannelsResponse {
        success: true,
        channels,
    }))
}

#[derive(Debug, Serialize)]
struct DeleteChannelResponse {
    success: bool,
    message: &'static str,
    channel: Channel,
}

async fn delete_channel(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteChannelResponse>> {
    let channel = channel_queries::delete_by_channel_id(&state.db, id)
        .await
        .map_err(|err| AppError::internal(err, &request_id.0))?
        .ok_or_else(|| {
            AppError::NotFound("channel not found".to_string()).with_request_id(&request_id.0)
        })?;

    Ok(Json(DeleteChannelResponse {
        success: true,
        message: "Channel removed",
        channel,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> UpdateStatsRequest {
        UpdateStatsRequest {
            channel_id: -1001234567890,
            title: "Rust Weekly".to_string(),
            username: Some("rustweekly".to_string()),
            description: Some("A channel about Rust".to_string()),
            subscribers_count: Some(1200),
            photo_url: None,
            categories: vec!["Technology".to_string()],
            thematic_tags: vec!["ai".to_string()],
            format_tags: vec!["digests".to_string()],
            owner_telegram_id: Some(42),
            owner_username: Some("owner".to_string()),
            is_published: Some(true),
        }
    }

    #[test]
    fn test_validate_accepts_publish_payload() {
        assert!(validate_update_stats(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_title() {
        let mut req = valid_request();
        req.title = "  ".to_string();
        assert!(validate_update_stats(&req).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_categories() {
        let mut req = valid_request();
        req.categories.clear();
        assert!(validate_update_stats(&req).is_err());
    }

    #[test]
    fn test_validate_rejects_too_many_categories() {
        let mut req = valid_request();
        req.categories = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        assert!(validate_update_stats(&req).is_err());
    }

    #[test]
    fn test_validate_rejects_tag_overflow() {
        let mut req = valid_request();
        req.thematic_tags = (0..6).map(|i| format!("tag{i}")).collect();
        assert!(validate_update_stats(&req).is_err());

        let mut req = valid_request();
        req.format_tags = (0..4).map(|i| format!("fmt{i}")).collect();
        assert!(validate_update_stats(&req).is_err());
    }

    #[test]
    fn test_validate_rejects_oversize_description() {
        let mut req = valid_request();
        req.description = Some("x".repeat(DESCRIPTION_MAX_CHARS + 1));
        assert!(validate_update_stats(&req).is_err());

        let mut req = valid_request();
        req.description = Some("x".repeat(DESCRIPTION_MAX_CHARS));
        assert!(validate_update_stats(&req).is_ok());
    }

    #[test]
    fn test_page_numbers() {
        assert_eq!(page_numbers(0, 50, 0), (1, 0));
        assert_eq!(page_numbers(120, 50, 0), (1, 3));
        assert_eq!(page_numbers(120, 50, 50), (2, 3));
        assert_eq!(page_numbers(120, 50, 100), (3, 3));
    }
}
