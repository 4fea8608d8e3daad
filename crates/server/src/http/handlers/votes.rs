use axum::{
    extract::{Path, State},
    Json,
};
use domain::{ActivityEvent, UserProfile, VoteDirection, VoteRecord, VoteResult, VoteTarget};
use serde::Deserialize;

use super::posts::load_post;
use crate::access::CommunityAccess;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::http::extract::ApiJson;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}

async fn target_community(state: &AppState, target: VoteTarget, target_id: &str) -> ApiResult<String> {
    let community_id = match target {
        VoteTarget::Post => state.db.get_post(target_id).await?.map(|p| p.community_id),
        VoteTarget::Comment => state.db.get_comment(target_id).await?.map(|c| c.community_id),
        VoteTarget::Reply => state.db.get_reply(target_id).await?.map(|r| r.community_id),
    };
    community_id.ok_or(ApiError::NotFound(match target {
        VoteTarget::Post => "Post",
        VoteTarget::Comment => "Comment",
        VoteTarget::Reply => "Reply",
    }))
}

async fn vote(
    state: AppState,
    user: UserProfile,
    target: VoteTarget,
    target_id: String,
    direction: VoteDirection,
) -> ApiResult<Json<VoteResult>> {
    let community_id = target_community(&state, target, &target_id).await?;
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_can_interact()?;

    // Deleted between the lookup and the write.
    let cast = state
        .db
        .cast_vote(target, &target_id, &user.id, direction)
        .await?
        .ok_or(ApiError::NotFound("Vote target"))?;

    state.publish(ActivityEvent::VoteCast {
        community_id: cast.community_id,
        post_id: cast.post_id,
        target,
        target_id: target_id.clone(),
        target_creator_id: cast.creator_id,
        voter_id: user.id.clone(),
        voter_name: user.display_name.clone(),
        outcome: cast.outcome,
        vote_status: cast.vote_status,
    });

    Ok(Json(VoteResult {
        target,
        target_id,
        user_vote: cast.outcome.new_value,
        vote_status: cast.vote_status,
    }))
}

pub async fn vote_post(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
    ApiJson(payload): ApiJson<VoteRequest>,
) -> ApiResult<Json<VoteResult>> {
    vote(state, user, VoteTarget::Post, post_id, payload.direction).await
}

pub async fn vote_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<String>,
    ApiJson(payload): ApiJson<VoteRequest>,
) -> ApiResult<Json<VoteResult>> {
    vote(state, user, VoteTarget::Comment, comment_id, payload.direction).await
}

pub async fn vote_reply(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(reply_id): Path<String>,
    ApiJson(payload): ApiJson<VoteRequest>,
) -> ApiResult<Json<VoteResult>> {
    vote(state, user, VoteTarget::Reply, reply_id, payload.direction).await
}

pub async fn community_votes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
) -> ApiResult<Json<Vec<VoteRecord>>> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_can_view()?;
    Ok(Json(state.db.list_post_votes(&user.id, &community_id).await?))
}

pub async fn thread_votes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<VoteRecord>>> {
    let (post, access) = load_post(&state, &post_id, Some(&user.id)).await?;
    access.ensure_can_view()?;
    Ok(Json(state.db.list_thread_votes(&user.id, &post.id).await?))
}
