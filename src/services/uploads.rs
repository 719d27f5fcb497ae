//! Image uploads: multipart form reading, disk storage under `UPLOAD_DIR`,
//! best-effort removal and file serving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::{
    body::{Body, Bytes},
    extract::{Multipart, Request},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use uuid::Uuid;

use crate::errors::AppError;

/// Upper bound on request bodies accepted by the router.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Sub-directory of the upload root for project galleries and tier images.
pub const PROJECTS_DIR: &str = "projects";
/// Sub-directory of the upload root for profile pictures and banners.
pub const PROFILES_DIR: &str = "profiles";

/// A file part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Text fields and file parts of a multipart request, keyed by field name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Drain a multipart request. Parts carrying a file name are files.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();
            match field.file_name().map(|s| s.to_string()) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                    if !bytes.is_empty() {
                        form.files.insert(name, UploadedFile { file_name, bytes });
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read field: {e}")))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

/// Lower-cased extension of an uploaded image, rejecting anything that is not
/// a supported image type.
pub fn image_extension(file_name: &str) -> Result<String, AppError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::Validation(format!(
            "Unsupported image type, expected one of: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Store an uploaded image as `<upload_dir>/<sub_dir>/<prefix>_<uuid>.<ext>`
/// and return the stored path.
pub async fn save_image(
    upload_dir: &str,
    sub_dir: &str,
    prefix: &str,
    file: &UploadedFile,
) -> Result<String, AppError> {
    let ext = image_extension(&file.file_name)?;
    let dir: PathBuf = Path::new(upload_dir).join(sub_dir);
    tokio::fs::create_dir_all(&dir).await?;

    let path = dir.join(format!("{prefix}_{}.{ext}", Uuid::new_v4().simple()));
    tokio::fs::write(&path, &file.bytes).await?;

    tracing::debug!(path = %path.display(), size = file.bytes.len(), "Stored upload");
    Ok(path.to_string_lossy().into_owned())
}

/// Delete a stored file. Failures are logged and otherwise ignored.
pub async fn remove_file(path: &str) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path, error = %e, "Failed to remove stored file");
    }
}

/// Settle a file swap once the record pointing at it has been written.
///
/// On success the superseded file is removed; on failure the fresh upload is,
/// so the record never points at a deleted file and no upload is orphaned.
pub async fn settle_replacement<T>(
    write: Result<T, AppError>,
    fresh: Option<&str>,
    superseded: Option<&str>,
) -> Result<T, AppError> {
    let discard = if write.is_ok() { superseded } else { fresh };
    if let Some(path) = discard {
        remove_file(path).await;
    }
    write
}

/// Stream a stored file back to the client, honouring conditional and range
/// headers of the original request.
pub async fn serve_file(path: &str, request: Request) -> Result<Response, AppError> {
    if tokio::fs::metadata(path).await.is_err() {
        tracing::warn!(path, "Stored file is missing");
        return Err(AppError::NotFound("Image not found".to_string()));
    }

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to serve file: {e}")))?;
    Ok(response.map(Body::new).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extension_is_normalised() {
        assert_eq!(image_extension("Cover.PNG").unwrap(), "png");
        assert_eq!(image_extension("a.b.jpeg").unwrap(), "jpeg");
    }

    #[test]
    fn non_image_uploads_are_rejected() {
        assert!(image_extension("script.sh").is_err());
        assert!(image_extension("noext").is_err());
    }

    #[tokio::test]
    async fn save_then_remove_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let upload_dir = root.path().to_str().unwrap();
        let file = UploadedFile {
            file_name: "photo.webp".to_string(),
            bytes: Bytes::from_static(b"RIFF....WEBP"),
        };

        let stored = save_image(upload_dir, PROJECTS_DIR, "project_3_img", &file)
            .await
            .unwrap();
        assert!(stored.ends_with(".webp"));
        assert!(stored.contains("project_3_img_"));
        assert_eq!(tokio::fs::read(&stored).await.unwrap(), b"RIFF....WEBP");

        remove_file(&stored).await;
        assert!(tokio::fs::metadata(&stored).await.is_err());

        // removing again only logs
        remove_file(&stored).await;
    }

    async fn stored_pair(root: &tempfile::TempDir) -> (String, String) {
        let upload_dir = root.path().to_str().unwrap();
        let file = UploadedFile {
            file_name: "tier.png".to_string(),
            bytes: Bytes::from_static(b"\x89PNG"),
        };
        let old = save_image(upload_dir, PROJECTS_DIR, "project_1_img_tier", &file)
            .await
            .unwrap();
        let new = save_image(upload_dir, PROJECTS_DIR, "project_1_img_tier", &file)
            .await
            .unwrap();
        (old, new)
    }

    #[tokio::test]
    async fn successful_write_drops_superseded_file() {
        let root = tempfile::tempdir().unwrap();
        let (old, new) = stored_pair(&root).await;

        let value = settle_replacement(Ok(7), Some(new.as_str()), Some(old.as_str())).await.unwrap();
        assert_eq!(value, 7);
        assert!(tokio::fs::metadata(&old).await.is_err());
        assert!(tokio::fs::metadata(&new).await.is_ok());
    }

    #[tokio::test]
    async fn failed_write_keeps_original_and_drops_upload() {
        let root = tempfile::tempdir().unwrap();
        let (old, new) = stored_pair(&root).await;

        let err = settle_replacement::<()>(
            Err(AppError::Internal("write failed".into())),
            Some(new.as_str()),
            Some(old.as_str()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(tokio::fs::metadata(&old).await.is_ok());
        assert!(tokio::fs::metadata(&new).await.is_err());
    }

    #[tokio::test]
    async fn serving_a_missing_file_is_not_found() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let err = serve_file("/nonexistent/fundflow/file.png", request)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
