//! Project update posts.

use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};

use crate::db::{parse_object_id, PROJECT_BLOGS};
use crate::errors::AppError;
use crate::models::blog::{Blog, BlogDocument, BlogInput};

fn blogs(docs: &Database) -> Collection<BlogDocument> {
    docs.collection(PROJECT_BLOGS)
}

/// Posts of a project, newest first.
pub async fn list(docs: &Database, project_id: i64) -> Result<Vec<Blog>, AppError> {
    let found: Vec<BlogDocument> = blogs(docs)
        .find(doc! { "projectId": project_id })
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(found.into_iter().map(Blog::from).collect())
}

pub async fn create(docs: &Database, project_id: i64, input: &BlogInput) -> Result<Blog, AppError> {
    input.validate()?;
    let mut document = BlogDocument {
        id: None,
        project_id,
        title: input.title.trim().to_string(),
        content: input.content.clone(),
        created_at: Utc::now(),
    };
    let result = blogs(docs).insert_one(&document).await?;
    document.id = result.inserted_id.as_object_id();

    tracing::info!(project_id, "Blog post created");
    Ok(document.into())
}

pub async fn update(
    docs: &Database,
    project_id: i64,
    blog_id: &str,
    input: &BlogInput,
) -> Result<Blog, AppError> {
    input.validate()?;
    let id = parse_object_id(blog_id, "Blog")?;
    let filter = doc! { "_id": id, "projectId": project_id };
    let collection = blogs(docs);

    let mut document = collection
        .find_one(filter.clone())
        .await?
        .ok_or_else(|| AppError::NotFound("Blog not found".to_string()))?;
    document.title = input.title.trim().to_string();
    document.content = input.content.clone();
    collection.replace_one(filter, &document).await?;

    Ok(document.into())
}

pub async fn delete(docs: &Database, project_id: i64, blog_id: &str) -> Result<(), AppError> {
    let id = parse_object_id(blog_id, "Blog")?;
    let result = blogs(docs)
        .delete_one(doc! { "_id": id, "projectId": project_id })
        .await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Blog not found".to_string()));
    }
    Ok(())
}

pub async fn purge_project(docs: &Database, project_id: i64) -> Result<u64, AppError> {
    let result = blogs(docs)
        .delete_many(doc! { "projectId": project_id })
        .await?;
    Ok(result.deleted_count)
}
