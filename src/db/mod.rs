//! Connection setup for the relational pool and the document database.

use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::engagement::EngagementRecord;
use crate::models::follow::FollowDocument;

/// Collection holding one engagement record per (user, project).
pub const PROJECT_STATS: &str = "project_stats";
pub const PROJECT_BLOGS: &str = "project_blogs";
pub const PROJECT_TIERS: &str = "project_tiers";
pub const PROJECT_REVIEWS: &str = "project_reviews";
pub const PROJECT_IMAGES: &str = "project_images";
pub const USER_FOLLOWS: &str = "user_follows";

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Open a handle to the document database. The driver connects lazily.
pub async fn connect_documents(url: &str, name: &str) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(url).await?;
    Ok(client.database(name))
}

/// Create the unique indexes the engagement and follow collections rely on.
pub async fn ensure_indexes(docs: &Database) -> Result<(), mongodb::error::Error> {
    let unique = IndexOptions::builder().unique(true).build();

    docs.collection::<EngagementRecord>(PROJECT_STATS)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "userId": 1, "projectId": 1 })
                .options(unique.clone())
                .build(),
        )
        .await?;

    docs.collection::<FollowDocument>(USER_FOLLOWS)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "userUrl": 1, "followsUserUrl": 1 })
                .options(unique)
                .build(),
        )
        .await?;

    Ok(())
}

/// Parse a path id into an [`ObjectId`]. Malformed ids read as a missing `what`.
pub fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::NotFound(format!("{what} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_object_id_reads_as_not_found() {
        let err = parse_object_id("not-an-id", "Blog").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: Blog not found");
    }

    #[test]
    fn hex_object_id_parses() {
        let oid = ObjectId::new();
        assert_eq!(parse_object_id(&oid.to_hex(), "Tier").unwrap(), oid);
    }
}
