//! Reward tiers with an optional image.

use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};

use crate::db::{parse_object_id, PROJECT_TIERS};
use crate::errors::AppError;
use crate::models::tier::{Tier, TierDocument, TierInput};
use crate::services::uploads::{self, UploadedFile, PROJECTS_DIR};

fn tiers(docs: &Database) -> Collection<TierDocument> {
    docs.collection(PROJECT_TIERS)
}

fn image_prefix(project_id: i64) -> String {
    format!("project_{project_id}_img_tier")
}

pub async fn list(docs: &Database, project_id: i64) -> Result<Vec<Tier>, AppError> {
    let found: Vec<TierDocument> = tiers(docs)
        .find(doc! { "projectId": project_id })
        .sort(doc! { "price": 1 })
        .await?
        .try_collect()
        .await?;
    Ok(found.into_iter().map(Tier::from).collect())
}

/// Stored image path of a tier, 404 when the tier or its image is absent.
pub async fn image_path(docs: &Database, project_id: i64, tier_id: &str) -> Result<String, AppError> {
    let id = parse_object_id(tier_id, "Tier")?;
    let tier = tiers(docs)
        .find_one(doc! { "_id": id, "projectId": project_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Tier not found".to_string()))?;
    tier.src_image
        .ok_or_else(|| AppError::NotFound("Tier has no image".to_string()))
}

pub async fn create(
    docs: &Database,
    upload_dir: &str,
    project_id: i64,
    input: TierInput,
    image: Option<UploadedFile>,
) -> Result<Tier, AppError> {
    let src_image = match image {
        Some(file) => {
            Some(uploads::save_image(upload_dir, PROJECTS_DIR, &image_prefix(project_id), &file).await?)
        }
        None => None,
    };

    let mut document = TierDocument {
        id: None,
        project_id,
        title: input.title,
        description: input.description,
        price: input.price,
        src_image,
    };
    let inserted = tiers(docs).insert_one(&document).await.map_err(AppError::from);
    let result =
        uploads::settle_replacement(inserted, document.src_image.as_deref(), None).await?;
    document.id = result.inserted_id.as_object_id();

    tracing::info!(project_id, "Tier created");
    Ok(document.into())
}

/// Replace a tier's fields. A new image supersedes the old file, which is
/// removed only once the document is written.
pub async fn update(
    docs: &Database,
    upload_dir: &str,
    project_id: i64,
    tier_id: &str,
    input: TierInput,
    image: Option<UploadedFile>,
) -> Result<Tier, AppError> {
    let id = parse_object_id(tier_id, "Tier")?;
    let filter = doc! { "_id": id, "projectId": project_id };
    let collection = tiers(docs);

    let mut document = collection
        .find_one(filter.clone())
        .await?
        .ok_or_else(|| AppError::NotFound("Tier not found".to_string()))?;

    let previous = document.src_image.clone();
    let fresh = match image {
        Some(file) => {
            let stored =
                uploads::save_image(upload_dir, PROJECTS_DIR, &image_prefix(project_id), &file)
                    .await?;
            document.src_image = Some(stored.clone());
            Some(stored)
        }
        None => None,
    };
    document.title = input.title;
    document.description = input.description;
    document.price = input.price;

    let written = collection
        .replace_one(filter, &document)
        .await
        .map_err(AppError::from);
    let superseded = fresh.as_ref().and(previous.as_deref());
    uploads::settle_replacement(written, fresh.as_deref(), superseded).await?;

    Ok(document.into())
}

pub async fn delete(docs: &Database, project_id: i64, tier_id: &str) -> Result<(), AppError> {
    let id = parse_object_id(tier_id, "Tier")?;
    let document = tiers(docs)
        .find_one_and_delete(doc! { "_id": id, "projectId": project_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Tier not found".to_string()))?;
    if let Some(src) = document.src_image {
        uploads::remove_file(&src).await;
    }
    Ok(())
}

/// Delete every tier of a project together with its image files.
pub async fn purge_project(docs: &Database, project_id: i64) -> Result<u64, AppError> {
    let collection = tiers(docs);
    let found: Vec<TierDocument> = collection
        .find(doc! { "projectId": project_id })
        .await?
        .try_collect()
        .await?;
    for src in found.iter().filter_map(|t| t.src_image.as_deref()) {
        uploads::remove_file(src).await;
    }
    let result = collection
        .delete_many(doc! { "projectId": project_id })
        .await?;
    Ok(result.deleted_count)
}
