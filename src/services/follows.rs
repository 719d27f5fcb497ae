//! Follow graph between users, keyed by user url.

use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Collection, Database};
use sqlx::PgPool;

use crate::db::USER_FOLLOWS;
use crate::errors::AppError;
use crate::models::follow::FollowDocument;

const DUPLICATE_KEY: i32 = 11000;

fn follows(docs: &Database) -> Collection<FollowDocument> {
    docs.collection(USER_FOLLOWS)
}

async fn url_of(pool: &PgPool, user_id: i64) -> Result<String, AppError> {
    sqlx::query_scalar::<_, String>("SELECT url FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

async fn ensure_user_exists(pool: &PgPool, url: &str) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE url = $1)")
        .bind(url)
        .fetch_one(pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound("User not found".to_string()))
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// The caller starts following `target_url`.
pub async fn follow(
    pool: &PgPool,
    docs: &Database,
    follower_id: i64,
    target_url: &str,
) -> Result<FollowDocument, AppError> {
    let follower_url = url_of(pool, follower_id).await?;
    if follower_url == target_url {
        return Err(AppError::Validation("You cannot follow yourself".to_string()));
    }
    ensure_user_exists(pool, target_url).await?;

    let mut document = FollowDocument {
        id: None,
        user_url: target_url.to_string(),
        follows_user_url: follower_url,
    };
    let result = follows(docs).insert_one(&document).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::Conflict("Already following this user".to_string())
        } else {
            AppError::Document(e)
        }
    })?;
    document.id = result.inserted_id.as_object_id();

    tracing::info!(follower = %document.follows_user_url, followed = %target_url, "User followed");
    Ok(document)
}

pub async fn unfollow(
    pool: &PgPool,
    docs: &Database,
    follower_id: i64,
    target_url: &str,
) -> Result<(), AppError> {
    let follower_url = url_of(pool, follower_id).await?;
    let result = follows(docs)
        .delete_one(doc! { "userUrl": target_url, "followsUserUrl": follower_url.as_str() })
        .await?;
    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Not following this user".to_string()));
    }
    Ok(())
}

/// Urls of the users following `user_url`.
pub async fn followers(docs: &Database, user_url: &str) -> Result<Vec<String>, AppError> {
    let found: Vec<FollowDocument> = follows(docs)
        .find(doc! { "userUrl": user_url })
        .await?
        .try_collect()
        .await?;
    Ok(found.into_iter().map(|f| f.follows_user_url).collect())
}

/// Urls of the users `user_url` follows.
pub async fn following(docs: &Database, user_url: &str) -> Result<Vec<String>, AppError> {
    let found: Vec<FollowDocument> = follows(docs)
        .find(doc! { "followsUserUrl": user_url })
        .await?
        .try_collect()
        .await?;
    Ok(found.into_iter().map(|f| f.user_url).collect())
}

/// `(followers, following)` counts for a profile.
pub async fn counts(docs: &Database, user_url: &str) -> Result<(u64, u64), AppError> {
    let collection = follows(docs);
    let followers = collection
        .count_documents(doc! { "userUrl": user_url })
        .await?;
    let following = collection
        .count_documents(doc! { "followsUserUrl": user_url })
        .await?;
    Ok((followers, following))
}

pub async fn is_following(
    docs: &Database,
    follower_url: &str,
    target_url: &str,
) -> Result<bool, AppError> {
    let found = follows(docs)
        .find_one(doc! { "userUrl": target_url, "followsUserUrl": follower_url })
        .await?;
    Ok(found.is_some())
}

/// Rewrite every edge after a user's url changes.
pub async fn rename_user(docs: &Database, old_url: &str, new_url: &str) -> Result<(), AppError> {
    let collection = follows(docs);
    collection
        .update_many(doc! { "userUrl": old_url }, doc! { "$set": { "userUrl": new_url } })
        .await?;
    collection
        .update_many(
            doc! { "followsUserUrl": old_url },
            doc! { "$set": { "followsUserUrl": new_url } },
        )
        .await?;
    Ok(())
}

/// Remove every edge touching the user.
pub async fn purge_user(docs: &Database, user_url: &str) -> Result<u64, AppError> {
    let result = follows(docs)
        .delete_many(doc! { "$or": [ { "userUrl": user_url }, { "followsUserUrl": user_url } ] })
        .await?;
    Ok(result.deleted_count)
}
