use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Review of a project stored in `project_reviews`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: i64,
    /// Reviewing user.
    pub user_id: i64,
    pub user_url: String,
    pub username: String,
    /// Owner of the reviewed project, denormalised for the "reviewed" listing.
    pub project_creator_id: i64,
    pub body: String,
    pub rating: i32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub project_id: i64,
    pub user_id: i64,
    pub user_url: String,
    pub username: String,
    pub project_creator_id: i64,
    pub body: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewDocument> for Review {
    fn from(doc: ReviewDocument) -> Self {
        Self {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default(),
            project_id: doc.project_id,
            user_id: doc.user_id,
            user_url: doc.user_url,
            username: doc.username,
            project_creator_id: doc.project_creator_id,
            body: doc.body,
            rating: doc.rating,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    #[serde(default)]
    pub body: String,
    pub rating: i32,
}

impl ReviewInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.body.trim().is_empty() {
            return Err(AppError::Validation("Review body is required".to_string()));
        }
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_must_be_in_range() {
        let mut input = ReviewInput {
            body: "Great team".into(),
            rating: 6,
        };
        assert!(input.validate().is_err());
        input.rating = 5;
        assert!(input.validate().is_ok());
        input.rating = 0;
        assert!(input.validate().is_err());
    }
}
