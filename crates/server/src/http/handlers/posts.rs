use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use domain::{validation, ActivityEvent, NewPost, Post, PostReport, PostSort};
use serde::Deserialize;

use super::PageQuery;
use crate::access::CommunityAccess;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::{ApiError, ApiResult};
use crate::http::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub sort: PostSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FeedQuery {
    fn bounds(&self) -> (i64, i64) {
        PageQuery {
            limit: self.limit,
            offset: self.offset,
        }
        .bounds()
    }
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub community: Option<String>,
    pub from: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct ReportRequest {
    pub reason: String,
}

pub(crate) async fn load_post(
    state: &AppState,
    post_id: &str,
    viewer: Option<&str>,
) -> ApiResult<(Post, CommunityAccess)> {
    let post = state
        .db
        .get_post(post_id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    let access = CommunityAccess::load(&state.db, &post.community_id, viewer).await?;
    Ok((post, access))
}

pub async fn community_feed(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(community_id): Path<String>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let access = CommunityAccess::load(&state.db, &community_id, viewer.id()).await?;
    access.ensure_can_view()?;

    let (limit, offset) = query.bounds();
    let posts = state
        .db
        .list_community_posts(&community_id, viewer.id(), query.sort, limit, offset)
        .await?;
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
    ApiJson(payload): ApiJson<NewPost>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_can_post()?;
    let draft = payload.validate()?;

    let post = state.db.create_post(&community_id, &user, &draft).await?;
    tracing::info!("Post {} created in {} by {}", post.id, community_id, user.id);

    state.publish(ActivityEvent::PostCreated {
        community_id,
        post: post.clone(),
    });
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Post>> {
    let (post, access) = load_post(&state, &post_id, viewer.id()).await?;
    access.ensure_can_view()?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> ApiResult<StatusCode> {
    let (post, access) = load_post(&state, &post_id, Some(&user.id)).await?;
    access.ensure_can_delete(&post.creator_id, &user.id)?;

    if !state.db.delete_post(&post.id).await? {
        return Err(ApiError::NotFound("Post"));
    }
    tracing::info!("Post {} deleted by {}", post.id, user.id);

    state.publish(ActivityEvent::PostDeleted {
        community_id: post.community_id,
        post_id: post.id,
    });
    Ok(StatusCode::NO_CONTENT)
}

/// Joined communities first; anonymous callers and users without
/// memberships get the public listing.
pub async fn home_feed(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let (limit, offset) = query.bounds();
    let posts = state
        .db
        .home_feed(viewer.id(), query.sort, limit, offset)
        .await?;
    Ok(Json(posts))
}

pub async fn upcoming_events(
    State(state): State<AppState>,
    viewer: MaybeUser,
    ApiQuery(query): ApiQuery<EventsQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let community = query.community.as_deref().filter(|c| !c.is_empty());
    if let Some(community_id) = community {
        let access = CommunityAccess::load(&state.db, community_id, viewer.id()).await?;
        access.ensure_can_view()?;
    }

    let from = query.from.unwrap_or_else(|| Utc::now().date_naive());
    let (limit, offset) = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();
    let posts = state
        .db
        .upcoming_events(viewer.id(), community, from, limit, offset)
        .await?;
    Ok(Json(posts))
}

// --- per-user flags ---

pub async fn save_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> ApiResult<StatusCode> {
    let (post, access) = load_post(&state, &post_id, Some(&user.id)).await?;
    access.ensure_can_view()?;
    state.db.save_post(&user.id, &post.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unsave_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.unsave_post(&user.id, &post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn hide_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> ApiResult<StatusCode> {
    let (post, _) = load_post(&state, &post_id, Some(&user.id)).await?;
    state.db.hide_post(&user.id, &post.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unhide_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.unhide_post(&user.id, &post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn report_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    ApiJson(payload): ApiJson<ReportRequest>,
) -> ApiResult<(StatusCode, Json<PostReport>)> {
    let (post, access) = load_post(&state, &post_id, Some(&user.id)).await?;
    access.ensure_can_view()?;
    let reason = validation::require_text("Reason", &payload.reason, validation::DESCRIPTION_MAX)?;

    let report = state
        .db
        .report_post(&post, &user.id, &reason)
        .await?
        .ok_or_else(|| ApiError::Conflict("You already reported this post".into()))?;
    tracing::info!("Post {} reported by {}", post.id, user.id);
    Ok((StatusCode::CREATED, Json(report)))
}
