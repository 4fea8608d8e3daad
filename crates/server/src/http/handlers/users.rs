use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::{validation, Post, UserProfile};
use serde::{Deserialize, Serialize};
use storage::UserSnippets;

use super::PageQuery;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::http::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
}

fn validate_email(email: &str) -> ApiResult<String> {
    let email = email.trim().to_lowercase();
    let valid = email.len() <= 254
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    Ok(email)
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let email = validate_email(&payload.email)?;
    let display_name = validation::validate_display_name(&payload.display_name)?;

    let (token, digest) = state.tokens.issue();
    let user = state
        .db
        .create_user(&email, &display_name, &digest)
        .await?
        .ok_or_else(|| ApiError::Conflict("Email is already registered".into()))?;

    tracing::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

pub async fn rotate_token(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<SessionResponse>> {
    let (token, digest) = state.tokens.issue();
    if !state.db.rotate_token(&user.id, &digest).await? {
        return Err(ApiError::NotFound("User"));
    }
    Ok(Json(SessionResponse { user, token }))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user)
}

pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    let display_name = payload
        .display_name
        .as_deref()
        .map(validation::validate_display_name)
        .transpose()?;
    let bio = payload
        .bio
        .as_deref()
        .map(|b| validation::limit_text("Bio", b.trim(), validation::DESCRIPTION_MAX))
        .transpose()?;

    let updated = state
        .db
        .update_profile(
            &user.id,
            display_name.as_deref(),
            payload.photo_url.as_deref(),
            bio.as_deref(),
        )
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(updated))
}

#[derive(Serialize)]
pub struct PublicProfile {
    pub id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
}

impl From<UserProfile> for PublicProfile {
    fn from(u: UserProfile) -> Self {
        PublicProfile {
            id: u.id,
            display_name: u.display_name,
            photo_url: u.photo_url,
            bio: u.bio,
        }
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<PublicProfile>> {
    let user = state
        .db
        .get_user(&user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user.into()))
}

pub async fn my_snippets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<UserSnippets>> {
    Ok(Json(state.db.user_snippets(&user.id).await?))
}

pub async fn my_saved_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(state.db.list_saved_posts(&user.id, limit, offset).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert_eq!(validate_email(" Ana@Example.org ").unwrap(), "ana@example.org");
        assert!(validate_email("ana").is_err());
        assert!(validate_email("@example.org").is_err());
        assert!(validate_email("ana@localhost").is_err());
    }
}
