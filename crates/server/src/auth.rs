use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use domain::UserProfile;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Issues opaque bearer tokens and derives the digest stored for lookup.
/// Only the digest is persisted.
#[derive(Clone)]
pub struct TokenService {
    mac: HmacSha256,
}

impl TokenService {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid token secret: {}", e))?;
        Ok(Self { mac })
    }

    pub fn issue(&self) -> (String, String) {
        let token = URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>());
        let digest = self.digest(&token);
        (token, digest)
    }

    pub fn digest(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

async fn resolve(state: &AppState, token: &str) -> Result<UserProfile, ApiError> {
    let digest = state.tokens.digest(token);
    state
        .db
        .find_user_by_token(&digest)
        .await?
        .ok_or(ApiError::Unauthorized)
}

pub struct AuthUser(pub UserProfile);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers).ok_or(ApiError::Unauthorized)?;
        resolve(state, token).await.map(AuthUser)
    }
}

/// Anonymous when no token is sent; a token that is sent must be valid.
pub struct MaybeUser(pub Option<UserProfile>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer(&parts.headers) {
            Some(token) => resolve(state, token).await.map(|u| MaybeUser(Some(u))),
            None => Ok(MaybeUser(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_tokens_are_unique_and_digest_is_stable() {
        let tokens = TokenService::new("secret").unwrap();
        let (t1, d1) = tokens.issue();
        let (t2, d2) = tokens.issue();
        assert_ne!(t1, t2);
        assert_ne!(d1, d2);
        assert_eq!(tokens.digest(&t1), d1);
        assert_eq!(d1.len(), 64);

        let other = TokenService::new("another secret").unwrap();
        assert_ne!(other.digest(&t1), d1);
    }

    #[test]
    fn test_bearer_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer(&headers), None);
    }
}
