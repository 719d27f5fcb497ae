//! Project reviews. Reviewer and project creator are resolved server-side.

use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};
use sqlx::PgPool;

use crate::db::{parse_object_id, PROJECT_REVIEWS};
use crate::errors::AppError;
use crate::middleware::rbac::{self, RequestContext};
use crate::models::review::{Review, ReviewDocument, ReviewInput};
use crate::services::auth as auth_service;

fn reviews(docs: &Database) -> Collection<ReviewDocument> {
    docs.collection(PROJECT_REVIEWS)
}

async fn find_many(docs: &Database, filter: Document) -> Result<Vec<Review>, AppError> {
    let found: Vec<ReviewDocument> = reviews(docs)
        .find(filter)
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(found.into_iter().map(Review::from).collect())
}

pub async fn list(docs: &Database, project_id: i64) -> Result<Vec<Review>, AppError> {
    find_many(docs, doc! { "projectId": project_id }).await
}

/// Reviews written by the user.
pub async fn reviewing(docs: &Database, user_id: i64) -> Result<Vec<Review>, AppError> {
    find_many(docs, doc! { "userId": user_id }).await
}

/// Reviews left on the user's projects.
pub async fn reviewed(docs: &Database, user_id: i64) -> Result<Vec<Review>, AppError> {
    find_many(docs, doc! { "projectCreatorId": user_id }).await
}

pub async fn create(
    pool: &PgPool,
    docs: &Database,
    project_id: i64,
    user_id: i64,
    input: &ReviewInput,
) -> Result<Review, AppError> {
    input.validate()?;
    let project_creator_id = rbac::project_owner(pool, project_id).await?;
    let reviewer = auth_service::find_user_by_id(pool, user_id).await?;

    let mut document = ReviewDocument {
        id: None,
        project_id,
        user_id,
        user_url: reviewer.url,
        username: reviewer.username,
        project_creator_id,
        body: input.body.trim().to_string(),
        rating: input.rating,
        created_at: Utc::now(),
    };
    let result = reviews(docs).insert_one(&document).await?;
    document.id = result.inserted_id.as_object_id();

    tracing::info!(project_id, user_id, rating = input.rating, "Review posted");
    Ok(document.into())
}

/// Reviews may be removed by their author, the project's owner or an admin.
pub fn ensure_review_access(
    ctx: &RequestContext,
    author_id: i64,
    project_owner_id: i64,
) -> Result<(), AppError> {
    if ctx.user_id == author_id {
        return Ok(());
    }
    ctx.ensure_owner(project_owner_id)
}

pub async fn delete(
    pool: &PgPool,
    docs: &Database,
    project_id: i64,
    review_id: &str,
    ctx: &RequestContext,
) -> Result<(), AppError> {
    let id = parse_object_id(review_id, "Review")?;
    let filter = doc! { "_id": id, "projectId": project_id };
    let collection = reviews(docs);

    let review = collection
        .find_one(filter.clone())
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;
    let owner = rbac::project_owner(pool, project_id).await?;
    ensure_review_access(ctx, review.user_id, owner).inspect_err(|_| {
        tracing::warn!(project_id, user_id = ctx.user_id, "Rejected review deletion");
    })?;

    collection.delete_one(filter).await?;
    Ok(())
}

fn author_update(user_url: &str, username: &str) -> Document {
    doc! { "$set": { "userUrl": user_url, "username": username } }
}

/// Refresh the denormalised author name and url on every review by the user.
pub async fn rename_author(
    docs: &Database,
    user_id: i64,
    user_url: &str,
    username: &str,
) -> Result<u64, AppError> {
    let result = reviews(docs)
        .update_many(doc! { "userId": user_id }, author_update(user_url, username))
        .await?;
    Ok(result.modified_count)
}

pub async fn purge_project(docs: &Database, project_id: i64) -> Result<u64, AppError> {
    let result = reviews(docs)
        .delete_many(doc! { "projectId": project_id })
        .await?;
    Ok(result.deleted_count)
}

pub async fn purge_user(docs: &Database, user_id: i64) -> Result<u64, AppError> {
    let result = reviews(docs).delete_many(doc! { "userId": user_id }).await?;
    Ok(result.deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(user_id: i64, is_admin: bool) -> RequestContext {
        RequestContext { user_id, is_admin }
    }

    #[test]
    fn author_may_delete_own_review() {
        assert!(ensure_review_access(&ctx(7, false), 7, 2).is_ok());
    }

    #[test]
    fn project_owner_may_delete_reviews_on_their_project() {
        assert!(ensure_review_access(&ctx(2, false), 7, 2).is_ok());
    }

    #[test]
    fn admin_may_delete_any_review() {
        assert!(ensure_review_access(&ctx(1, true), 7, 2).is_ok());
    }

    #[test]
    fn author_update_sets_url_and_username() {
        let update = author_update("ada_l", "Ada L");
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("userUrl").unwrap(), "ada_l");
        assert_eq!(set.get_str("username").unwrap(), "Ada L");
    }

    #[test]
    fn unrelated_user_is_forbidden() {
        let err = ensure_review_access(&ctx(9, false), 7, 2).unwrap_err();
        assert!(err.is_forbidden());
    }
}
