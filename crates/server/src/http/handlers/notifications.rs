use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::UserNotification;
use serde::{Deserialize, Serialize};

use super::PageQuery;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::http::extract::ApiQuery;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<InboxQuery>,
) -> ApiResult<Json<Vec<UserNotification>>> {
    let (limit, offset) = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();
    let items = state
        .db
        .list_notifications(&user.id, query.unread_only, limit, offset)
        .await?;
    Ok(Json(items))
}

pub async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<UnreadCount>> {
    let unread = state.db.unread_notification_count(&user.id).await?;
    Ok(Json(UnreadCount { unread }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.db.mark_notification_read(&user.id, &notification_id).await? {
        return Err(ApiError::NotFound("Notification"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<MarkedRead>> {
    let updated = state.db.mark_all_notifications_read(&user.id).await?;
    Ok(Json(MarkedRead { updated }))
}
