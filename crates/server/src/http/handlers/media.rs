use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::media::{MediaStore, StoredMedia};

pub async fn upload_media(
    State(store): State<MediaStore>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<StoredMedia>)> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read upload bytes");
            ApiError::BadRequest("Failed to read file data".into())
        })?;
        upload = Some((bytes.to_vec(), content_type));
    }

    let (data, content_type) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".into()))?;
    let stored = store.save(&data, &content_type).await?;
    tracing::info!("{} uploaded {}", user.id, stored.hash);
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn serve_media(
    State(store): State<MediaStore>,
    Path(filename): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (data, content_type) = store
        .load(&filename)
        .await?
        .ok_or(ApiError::NotFound("File"))?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        data,
    ))
}
