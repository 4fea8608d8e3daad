use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::{ActivityEvent, Community, CommunityUpdate, ModeratorSnippet, NewCommunity};
use serde::{Deserialize, Serialize};
use storage::CreateCommunityOutcome;

use super::PageQuery;
use crate::access::CommunityAccess;
use crate::auth::{AuthUser, MaybeUser};
use crate::error::{ApiError, ApiResult};
use crate::http::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct CommunityList {
    pub communities: Vec<Community>,
    pub total: i64,
}

#[derive(Serialize)]
pub struct CommunityView {
    #[serde(flatten)]
    pub community: Community,
    pub moderators: Vec<ModeratorSnippet>,
    pub is_member: bool,
    pub is_moderator: bool,
    pub is_banned: bool,
}

#[derive(Serialize)]
pub struct MembershipResponse {
    pub community_id: String,
    pub is_member: bool,
    pub number_of_members: i64,
}

pub async fn list_communities(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<CommunityList>> {
    let (limit, offset) = PageQuery {
        limit: query.limit,
        offset: query.offset,
    }
    .bounds();
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let (communities, total) = state.db.list_communities(category, limit, offset).await?;
    Ok(Json(CommunityList { communities, total }))
}

pub async fn create_community(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<NewCommunity>,
) -> ApiResult<(StatusCode, Json<Community>)> {
    let name = payload.validate()?;

    match state.db.create_community(&name, &user.id, &payload).await? {
        CreateCommunityOutcome::Created(community) => {
            tracing::info!("Community {} created by {}", community.id, user.id);
            Ok((StatusCode::CREATED, Json(community)))
        }
        CreateCommunityOutcome::NameTaken => Err(ApiError::Conflict(format!(
            "Sorry, {} is taken. Try another.",
            name
        ))),
    }
}

/// Metadata is public even for private communities; their posts are not.
pub async fn get_community(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(community_id): Path<String>,
) -> ApiResult<Json<CommunityView>> {
    let access = CommunityAccess::load(&state.db, &community_id, viewer.id()).await?;
    let moderators = state.db.list_moderators(&community_id).await?;
    Ok(Json(CommunityView {
        community: access.community,
        moderators,
        is_member: access.membership.is_member,
        is_moderator: access.membership.is_moderator,
        is_banned: access.membership.is_banned,
    }))
}

pub async fn update_community(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
    ApiJson(update): ApiJson<CommunityUpdate>,
) -> ApiResult<Json<Community>> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_moderator()?;
    update.validate()?;

    let community = state
        .db
        .update_community(&community_id, &update)
        .await?
        .ok_or(ApiError::NotFound("Community"))?;
    Ok(Json(community))
}

pub async fn delete_community(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
) -> ApiResult<StatusCode> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_creator(&user.id)?;

    state.db.delete_community(&community_id).await?;
    tracing::info!("Community {} deleted by {}", community_id, user.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn join_community(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
) -> ApiResult<Json<MembershipResponse>> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_can_join()?;

    let change = state.db.join_community(&user.id, &community_id).await?;
    if change.changed() {
        state.publish(ActivityEvent::MemberJoined {
            community_id: community_id.clone(),
            community_creator_id: access.community.creator_id.clone(),
            user_id: user.id.clone(),
            display_name: user.display_name.clone(),
        });
    }
    membership_response(&state, &community_id, true).await
}

pub async fn leave_community(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
) -> ApiResult<Json<MembershipResponse>> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    if access.is_creator(&user.id) {
        return Err(ApiError::forbidden("The creator cannot leave their community"));
    }

    state.db.leave_community(&user.id, &community_id).await?;
    membership_response(&state, &community_id, false).await
}

async fn membership_response(
    state: &AppState,
    community_id: &str,
    is_member: bool,
) -> ApiResult<Json<MembershipResponse>> {
    let community = state
        .db
        .get_community(community_id)
        .await?
        .ok_or(ApiError::NotFound("Community"))?;
    Ok(Json(MembershipResponse {
        community_id: community.id,
        is_member,
        number_of_members: community.number_of_members,
    }))
}
