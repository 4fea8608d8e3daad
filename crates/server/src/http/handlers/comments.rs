use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::{validation, ActivityEvent, Comment, Reply};
use serde::{Deserialize, Serialize};

use super::posts::load_post;
use super::PageQuery;
use crate::access::CommunityAccess;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::{ApiError, ApiResult};
use crate::http::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct CommentList {
    pub comments: Vec<Comment>,
    pub total: i64,
}

async fn load_comment(
    state: &AppState,
    comment_id: &str,
    viewer: Option<&str>,
) -> ApiResult<(Comment, CommunityAccess)> {
    let comment = state
        .db
        .get_comment(comment_id)
        .await?
        .ok_or(ApiError::NotFound("Comment"))?;
    let access = CommunityAccess::load(&state.db, &comment.community_id, viewer).await?;
    Ok((comment, access))
}

pub async fn list_comments(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(post_id): Path<String>,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<CommentList>> {
    let (post, access) = load_post(&state, &post_id, viewer.id()).await?;
    access.ensure_can_view()?;

    let (limit, offset) = page.bounds();
    let (comments, total) = state.db.list_comments(&post.id, limit, offset).await?;
    Ok(Json(CommentList { comments, total }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let (post, access) = load_post(&state, &post_id, Some(&user.id)).await?;
    access.ensure_can_interact()?;
    let text = validation::validate_comment_text(&payload.text)?;

    let comment = state.db.create_comment(&post, &user, &text).await?;
    tracing::debug!("Comment {} on post {} by {}", comment.id, post.id, user.id);

    state.publish(ActivityEvent::CommentCreated {
        community_id: post.community_id,
        post_creator_id: post.creator_id,
        post_title: post.title,
        comment: comment.clone(),
    });
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<String>,
) -> ApiResult<StatusCode> {
    let (comment, access) = load_comment(&state, &comment_id, Some(&user.id)).await?;
    access.ensure_can_delete(&comment.creator_id, &user.id)?;

    state
        .db
        .delete_comment(&comment.id)
        .await?
        .ok_or(ApiError::NotFound("Comment"))?;
    Ok(StatusCode::NO_CONTENT)
}

// --- replies ---

pub async fn list_replies(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(comment_id): Path<String>,
) -> ApiResult<Json<Vec<Reply>>> {
    let (comment, access) = load_comment(&state, &comment_id, viewer.id()).await?;
    access.ensure_can_view()?;
    Ok(Json(state.db.list_replies(&comment.id).await?))
}

pub async fn create_reply(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<String>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Reply>)> {
    let (comment, access) = load_comment(&state, &comment_id, Some(&user.id)).await?;
    access.ensure_can_interact()?;
    let text = validation::validate_comment_text(&payload.text)?;

    let reply = state.db.create_reply(&comment, &user, &text).await?;

    state.publish(ActivityEvent::ReplyCreated {
        community_id: comment.community_id,
        comment_creator_id: comment.creator_id,
        reply: reply.clone(),
    });
    Ok((StatusCode::CREATED, Json(reply)))
}

pub async fn delete_reply(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(reply_id): Path<String>,
) -> ApiResult<StatusCode> {
    let reply = state
        .db
        .get_reply(&reply_id)
        .await?
        .ok_or(ApiError::NotFound("Reply"))?;
    let access = CommunityAccess::load(&state.db, &reply.community_id, Some(&user.id)).await?;
    access.ensure_can_delete(&reply.creator_id, &user.id)?;

    state
        .db
        .delete_reply(&reply.id)
        .await?
        .ok_or(ApiError::NotFound("Reply"))?;
    Ok(StatusCode::NO_CONTENT)
}
