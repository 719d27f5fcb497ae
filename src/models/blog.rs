use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Project update post stored in `project_blogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: i64,
    pub title: String,
    pub content: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: String,
    pub project_id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<BlogDocument> for Blog {
    fn from(doc: BlogDocument) -> Self {
        Self {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default(),
            project_id: doc.project_id,
            title: doc.title,
            content: doc.content,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlogInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl BlogInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(AppError::Validation(
                "Title and content are required!".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_input_requires_both_fields() {
        let input = BlogInput {
            title: "Week 3".into(),
            content: " ".into(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn response_exposes_hex_id() {
        let oid = ObjectId::new();
        let blog = Blog::from(BlogDocument {
            id: Some(oid),
            project_id: 4,
            title: "t".into(),
            content: "c".into(),
            created_at: Utc::now(),
        });
        assert_eq!(blog.id, oid.to_hex());
    }
}
