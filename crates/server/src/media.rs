//! Content-addressed image store for post images, community icons and
//! profile photos.
//!
//! Files live at `{media.dir}/{sha256}.{ext}`, so uploading the same image
//! twice yields the same URL.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::ApiError;

const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

#[derive(Debug, Clone, Serialize)]
pub struct StoredMedia {
    pub url: String,
    pub hash: String,
    pub size: usize,
    pub content_type: String,
}

#[derive(Clone)]
pub struct MediaStore {
    dir: PathBuf,
    max_bytes: usize,
    public_url: String,
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}

fn content_type_for(ext: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(_, e)| *e == ext)
        .map(|(ct, _)| *ct)
}

async fn write_then_rename(tmp: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp, data).await?;
    tokio::fs::rename(tmp, path).await
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize, public_url: &str) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn save(&self, data: &[u8], content_type: &str) -> Result<StoredMedia, ApiError> {
        if data.is_empty() {
            return Err(ApiError::BadRequest("Empty upload".into()));
        }
        if data.len() > self.max_bytes {
            return Err(ApiError::PayloadTooLarge(self.max_bytes));
        }
        let ext = extension_for(content_type).ok_or_else(|| {
            ApiError::BadRequest(format!("Unsupported content type: {}", content_type))
        })?;

        let hash = hex::encode(Sha256::digest(data));
        let filename = format!("{}.{}", hash, ext);
        let path = self.dir.join(&filename);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(anyhow::Error::from)?;
            // Readers never see a half-written file under the final name.
            let tmp = self
                .dir
                .join(format!(".{}.{:x}.tmp", filename, rand::random::<u64>()));
            if let Err(e) = write_then_rename(&tmp, &path, data).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(ApiError::Internal(e.into()));
            }
            tracing::info!(size = data.len(), %filename, "Stored media");
        }

        Ok(StoredMedia {
            url: format!("{}/media/{}", self.public_url, filename),
            hash,
            size: data.len(),
            content_type: content_type.to_string(),
        })
    }

    pub async fn load(&self, filename: &str) -> anyhow::Result<Option<(Vec<u8>, &'static str)>> {
        let Some((hash, ext)) = filename.split_once('.') else {
            return Ok(None);
        };
        let Some(content_type) = content_type_for(ext) else {
            return Ok(None);
        };
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(None);
        }

        match tokio::fs::read(self.dir.join(filename)).await {
            Ok(bytes) => Ok(Some((bytes, content_type))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(max_bytes: usize) -> MediaStore {
        let dir = std::env::temp_dir().join(format!("tumindig-media-{:x}", rand::random::<u64>()));
        MediaStore::new(dir, max_bytes, "")
    }

    #[tokio::test]
    async fn test_save_is_content_addressed() {
        let media = store(1024);
        let a = media.save(b"fake png bytes", "image/png").await.unwrap();
        let b = media.save(b"fake png bytes", "image/png").await.unwrap();
        assert_eq!(a.url, b.url);
        assert!(a.url.starts_with("/media/") && a.url.ends_with(".png"));

        let filename = a.url.trim_start_matches("/media/");
        let (bytes, ct) = media.load(filename).await.unwrap().unwrap();
        assert_eq!(bytes, b"fake png bytes");
        assert_eq!(ct, "image/png");
    }

    #[tokio::test]
    async fn test_rejects_bad_uploads() {
        let media = store(4);
        assert!(matches!(
            media.save(b"too long", "image/png").await,
            Err(ApiError::PayloadTooLarge(4))
        ));
        assert!(matches!(
            media.save(b"ok", "text/html").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(media.save(b"", "image/png").await, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_load_ignores_foreign_names() {
        let media = store(1024);
        assert!(media.load("../../etc/passwd").await.unwrap().is_none());
        assert!(media.load("abc.png").await.unwrap().is_none());
        assert!(media.load(&format!("{}.exe", "a".repeat(64))).await.unwrap().is_none());
        assert!(media.load(&format!("{}.png", "a".repeat(64))).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let media = store(1024);
        let a = media.save(b"first image", "image/png").await.unwrap();
        let b = media.save(b"second image", "image/webp").await.unwrap();

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&media.dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        let mut expected = vec![
            a.url.trim_start_matches("/media/").to_string(),
            b.url.trim_start_matches("/media/").to_string(),
        ];
        expected.sort();
        assert_eq!(names, expected);

        let (bytes, _) = media.load(&expected[0]).await.unwrap().unwrap();
        assert!(bytes == b"first image" || bytes == b"second image");
    }
}
