use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Reward tier stored in `project_tiers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub src_image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub id: String,
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub has_image: bool,
}

impl From<TierDocument> for Tier {
    fn from(doc: TierDocument) -> Self {
        Self {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default(),
            project_id: doc.project_id,
            title: doc.title,
            description: doc.description,
            price: doc.price,
            has_image: doc.src_image.is_some(),
        }
    }
}

/// Text fields of a tier form; the image arrives as a separate multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct TierInput {
    pub title: String,
    pub description: String,
    pub price: f64,
}

impl TierInput {
    /// Build from raw multipart text fields.
    pub fn parse(
        title: Option<&str>,
        description: Option<&str>,
        price: Option<&str>,
    ) -> Result<Self, AppError> {
        let missing =
            || AppError::Validation("title, description and price are required".to_string());

        let title = title.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(missing)?;
        let description = description
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(missing)?;
        let price: f64 = price
            .and_then(|p| p.trim().parse().ok())
            .ok_or_else(missing)?;

        if !price.is_finite() || price <= 0.0 {
            return Err(AppError::Validation("price must be positive".to_string()));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_valid_fields() {
        let input = TierInput::parse(Some("Early bird"), Some("Sticker pack"), Some("15.5")).unwrap();
        assert_eq!(input.price, 15.5);
        assert_eq!(input.title, "Early bird");
    }

    #[test]
    fn parse_rejects_missing_or_bad_price() {
        assert!(TierInput::parse(Some("a"), Some("b"), None).is_err());
        assert!(TierInput::parse(Some("a"), Some("b"), Some("free")).is_err());
        assert!(TierInput::parse(Some("a"), Some("b"), Some("-3")).is_err());
        assert!(TierInput::parse(Some(""), Some("b"), Some("3")).is_err());
    }
}
