//! Per-user, per-project engagement records and the summary folded from them.

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// One document per (user, project) in the `project_stats` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: i64,
    pub project_id: i64,
    pub category_id: i64,
    #[serde(default)]
    pub viewed: bool,
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub disliked: bool,
    #[serde(default)]
    pub is_collaborator: bool,
    #[serde(default)]
    pub funded_amount: f64,
}

impl EngagementRecord {
    /// Fresh record for a first view.
    pub fn viewed(user_id: i64, project_id: i64, category_id: i64) -> Self {
        Self {
            id: None,
            user_id,
            project_id,
            category_id,
            viewed: true,
            liked: false,
            disliked: false,
            is_collaborator: false,
            funded_amount: 0.0,
        }
    }

    /// Apply an evaluate/fund/collaborate request in place.
    ///
    /// `liked` and `disliked` are mutually exclusive; absent fields leave the
    /// record untouched. `funded_amount` is overwritten, not accumulated.
    pub fn apply(&mut self, update: &UpdateEngagement) {
        match update.evaluation {
            Some(Evaluation::Likes) => {
                self.liked = true;
                self.disliked = false;
            }
            Some(Evaluation::Dislikes) => {
                self.liked = false;
                self.disliked = true;
            }
            None => {}
        }
        if let Some(fund) = update.fund {
            self.funded_amount = fund;
        }
        if let Some(collaboration) = update.collaboration {
            self.is_collaborator = collaboration;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluation {
    Likes,
    Dislikes,
}

/// Body of `PUT /projects/{id}/stats`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEngagement {
    pub evaluation: Option<Evaluation>,
    pub fund: Option<f64>,
    pub collaboration: Option<bool>,
}

impl UpdateEngagement {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.fund {
            Some(fund) if !fund.is_finite() || fund < 0.0 => Err(AppError::Validation(
                "fund must be a non-negative amount".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Body of `POST /projects/{id}/stats`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id_category: Option<i64>,
}

/// Engagement totals for one project. Derived on every read, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub views: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub funded: f64,
    pub collaborators: i64,
}

/// Response for create-on-view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOutcome {
    pub created: bool,
    pub message: String,
}

/// A category's share of all recorded views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryViewShare {
    pub id_category: i64,
    pub views: i64,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: i64) -> EngagementRecord {
        EngagementRecord::viewed(user_id, 1, 1)
    }

    #[test]
    fn default_summary_is_all_zeros() {
        assert_eq!(
            ProjectSummary::default(),
            ProjectSummary {
                views: 0,
                likes: 0,
                dislikes: 0,
                funded: 0.0,
                collaborators: 0,
            }
        );
    }

    #[test]
    fn liking_clears_dislike() {
        let mut r = record(1);
        r.disliked = true;
        r.apply(&UpdateEngagement {
            evaluation: Some(Evaluation::Likes),
            ..Default::default()
        });
        assert!(r.liked);
        assert!(!r.disliked);

        r.apply(&UpdateEngagement {
            evaluation: Some(Evaluation::Dislikes),
            ..Default::default()
        });
        assert!(!r.liked);
        assert!(r.disliked);
    }

    #[test]
    fn absent_evaluation_keeps_prior_state() {
        let mut r = record(1);
        r.liked = true;
        r.apply(&UpdateEngagement {
            fund: Some(20.0),
            ..Default::default()
        });
        assert!(r.liked);
        assert!(!r.disliked);
    }

    #[test]
    fn fund_is_last_write_wins() {
        let mut r = record(1);
        r.apply(&UpdateEngagement {
            fund: Some(50.0),
            ..Default::default()
        });
        r.apply(&UpdateEngagement {
            fund: Some(30.0),
            collaboration: Some(true),
            ..Default::default()
        });
        assert_eq!(r.funded_amount, 30.0);
        assert!(r.is_collaborator);
    }

    #[test]
    fn negative_fund_is_rejected() {
        let update = UpdateEngagement {
            fund: Some(-1.0),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let json = serde_json::to_value(record(9)).unwrap();
        assert_eq!(json["userId"], 9);
        assert_eq!(json["isCollaborator"], false);
        assert_eq!(json["fundedAmount"], 0.0);
        assert!(json.get("_id").is_none());
    }

    #[test]
    fn evaluation_parses_request_values() {
        let update: UpdateEngagement =
            serde_json::from_str(r#"{"evaluation":"dislikes"}"#).unwrap();
        assert_eq!(update.evaluation, Some(Evaluation::Dislikes));
        assert!(update.fund.is_none());
    }
}
