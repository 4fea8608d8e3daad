use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::{BanSnippet, ModeratorSnippet, PostReport, SponsorSnippet};
use serde::Deserialize;

use crate::access::CommunityAccess;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BanRequest {
    pub reason: Option<String>,
}

// --- moderators ---

pub async fn list_moderators(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> ApiResult<Json<Vec<ModeratorSnippet>>> {
    if state.db.get_community(&community_id).await?.is_none() {
        return Err(ApiError::NotFound("Community"));
    }
    Ok(Json(state.db.list_moderators(&community_id).await?))
}

pub async fn add_moderator(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((community_id, target_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_moderator()?;

    let target = state.db.membership(&target_id, &community_id).await?;
    if !target.is_member {
        return Err(ApiError::BadRequest(
            "Only members can become moderators".into(),
        ));
    }
    if target.is_moderator {
        return Ok(StatusCode::NO_CONTENT);
    }

    state.db.add_moderator(&community_id, &target_id, &user.id).await?;
    tracing::info!("{} made {} a moderator of {}", user.id, target_id, community_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_moderator(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((community_id, target_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_creator(&user.id)?;
    if access.is_creator(&target_id) {
        return Err(ApiError::forbidden("The creator always moderates"));
    }

    let change = state.db.remove_moderator(&community_id, &target_id).await?;
    if !change.changed() {
        return Err(ApiError::NotFound("Moderator"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- sponsors ---

pub async fn list_sponsors(
    State(state): State<AppState>,
    Path(community_id): Path<String>,
) -> ApiResult<Json<Vec<SponsorSnippet>>> {
    if state.db.get_community(&community_id).await?.is_none() {
        return Err(ApiError::NotFound("Community"));
    }
    Ok(Json(state.db.list_sponsors(&community_id).await?))
}

pub async fn join_sponsors(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
) -> ApiResult<StatusCode> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_can_join()?;

    state.db.join_sponsors(&community_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave_sponsors(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.leave_sponsors(&community_id, &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- bans ---

pub async fn list_bans(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
) -> ApiResult<Json<Vec<BanSnippet>>> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_moderator()?;
    Ok(Json(state.db.list_bans(&community_id).await?))
}

pub async fn ban_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((community_id, target_id)): Path<(String, String)>,
    payload: Option<Json<BanRequest>>,
) -> ApiResult<StatusCode> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_moderator()?;
    if target_id == user.id || access.is_creator(&target_id) {
        return Err(ApiError::forbidden("That user cannot be banned"));
    }
    let target = state.db.membership(&target_id, &community_id).await?;
    if target.is_moderator && !access.is_creator(&user.id) {
        return Err(ApiError::forbidden("Only the creator can ban a moderator"));
    }
    if state.db.get_user(&target_id).await?.is_none() {
        return Err(ApiError::NotFound("User"));
    }

    let reason = payload.and_then(|Json(body)| body.reason);
    state
        .db
        .ban_user(&community_id, &target_id, &user.id, reason.as_deref())
        .await?;
    tracing::info!("{} banned {} from {}", user.id, target_id, community_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unban_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((community_id, target_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_moderator()?;

    let change = state.db.unban_user(&community_id, &target_id).await?;
    if !change.changed() {
        return Err(ApiError::NotFound("Ban"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- reports ---

pub async fn list_reports(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(community_id): Path<String>,
) -> ApiResult<Json<Vec<PostReport>>> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_moderator()?;
    Ok(Json(state.db.list_reports(&community_id).await?))
}

pub async fn dismiss_report(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((community_id, report_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let access = CommunityAccess::load(&state.db, &community_id, Some(&user.id)).await?;
    access.ensure_moderator()?;

    if !state.db.dismiss_report(&community_id, &report_id).await? {
        return Err(ApiError::NotFound("Report"));
    }
    Ok(StatusCode::NO_CONTENT)
}
