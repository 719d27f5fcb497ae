//! Project gallery images, capped per project.

use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};

use crate::db::{parse_object_id, PROJECT_IMAGES};
use crate::errors::AppError;
use crate::models::image::{ImageDocument, ProjectImage};
use crate::services::uploads::{self, UploadedFile, PROJECTS_DIR};

/// Maximum gallery images per project.
pub const MAX_IMAGES_PER_PROJECT: u64 = 4;

fn images(docs: &Database) -> Collection<ImageDocument> {
    docs.collection(PROJECT_IMAGES)
}

pub async fn list(docs: &Database, project_id: i64) -> Result<Vec<ProjectImage>, AppError> {
    let found: Vec<ImageDocument> = images(docs)
        .find(doc! { "projectId": project_id })
        .sort(doc! { "lastUpdated": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(found.into_iter().map(ProjectImage::from).collect())
}

pub async fn image_path(docs: &Database, project_id: i64, image_id: &str) -> Result<String, AppError> {
    let id = parse_object_id(image_id, "Image")?;
    images(docs)
        .find_one(doc! { "_id": id, "projectId": project_id })
        .await?
        .map(|image| image.src)
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))
}

fn ensure_capacity(existing: u64) -> Result<(), AppError> {
    if existing >= MAX_IMAGES_PER_PROJECT {
        return Err(AppError::Validation(format!(
            "A project can have at most {MAX_IMAGES_PER_PROJECT} images"
        )));
    }
    Ok(())
}

/// Same cap, applied to a recount that already includes the new image.
fn ensure_capacity_after_insert(count: u64) -> Result<(), AppError> {
    ensure_capacity(count.saturating_sub(1))
}

/// Store an image for a project.
///
/// The cap is checked before the upload and again once the document is
/// inserted; concurrent uploads that overshoot roll their own insert back, so
/// the gallery never ends up above the cap.
pub async fn add(
    docs: &Database,
    upload_dir: &str,
    project_id: i64,
    file: &UploadedFile,
) -> Result<ProjectImage, AppError> {
    let collection = images(docs);
    let filter = doc! { "projectId": project_id };
    ensure_capacity(collection.count_documents(filter.clone()).await?)?;

    let src = uploads::save_image(
        upload_dir,
        PROJECTS_DIR,
        &format!("project_{project_id}_img"),
        file,
    )
    .await?;
    let mut document = ImageDocument {
        id: None,
        project_id,
        src,
        last_updated: Utc::now(),
    };
    let inserted = collection.insert_one(&document).await.map_err(AppError::from);
    let result = uploads::settle_replacement(inserted, Some(document.src.as_str()), None).await?;
    document.id = result.inserted_id.as_object_id();

    let after = collection.count_documents(filter).await?;
    if let Err(e) = ensure_capacity_after_insert(after) {
        tracing::warn!(project_id, after, "Image cap overshot by concurrent upload");
        collection.delete_one(doc! { "_id": &result.inserted_id }).await?;
        uploads::remove_file(&document.src).await;
        return Err(e);
    }

    tracing::info!(project_id, "Project image added");
    Ok(document.into())
}

pub async fn delete(docs: &Database, project_id: i64, image_id: &str) -> Result<(), AppError> {
    let id = parse_object_id(image_id, "Image")?;
    let document = images(docs)
        .find_one_and_delete(doc! { "_id": id, "projectId": project_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    uploads::remove_file(&document.src).await;
    Ok(())
}

pub async fn purge_project(docs: &Database, project_id: i64) -> Result<u64, AppError> {
    let collection = images(docs);
    let found: Vec<ImageDocument> = collection
        .find(doc! { "projectId": project_id })
        .await?
        .try_collect()
        .await?;
    for image in &found {
        uploads::remove_file(&image.src).await;
    }
    let result = collection
        .delete_many(doc! { "projectId": project_id })
        .await?;
    Ok(result.deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifth_image_is_rejected() {
        assert!(ensure_capacity(0).is_ok());
        assert!(ensure_capacity(3).is_ok());
        let err = ensure_capacity(4).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn recount_after_insert_includes_the_new_image() {
        assert!(ensure_capacity_after_insert(1).is_ok());
        assert!(ensure_capacity_after_insert(4).is_ok());
        assert!(ensure_capacity_after_insert(5).is_err());
        assert!(ensure_capacity_after_insert(0).is_ok());
    }
}
