//! Project model. The funding target is either monetary or a collaborator
//! headcount; [`GoalKind`] makes any other combination unrepresentable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;
use crate::models::engagement::ProjectSummary;

const GOAL_TYPE_PRICE: &str = "price";
const GOAL_TYPE_COLLABORATORS: &str = "collaborators";

/// Funding target of a project, tagged on the wire by `typeGoal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "typeGoal")]
pub enum GoalKind {
    #[serde(rename = "price")]
    Monetary { goal: f64, currency: String },
    #[serde(rename = "collaborators")]
    Headcount { goal: i32 },
}

impl GoalKind {
    /// Discriminant stored in the `goal_type` column.
    pub fn goal_type(&self) -> &'static str {
        match self {
            GoalKind::Monetary { .. } => GOAL_TYPE_PRICE,
            GoalKind::Headcount { .. } => GOAL_TYPE_COLLABORATORS,
        }
    }

    /// `(price_goal, currency, coll_goal)` column values.
    pub fn columns(&self) -> (Option<f64>, Option<&str>, Option<i32>) {
        match self {
            GoalKind::Monetary { goal, currency } => (Some(*goal), Some(currency.as_str()), None),
            GoalKind::Headcount { goal } => (None, None, Some(*goal)),
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        match self {
            GoalKind::Monetary { goal, currency } => {
                if !goal.is_finite() || *goal <= 0.0 {
                    return Err(AppError::Validation(
                        "goal must be a positive amount".to_string(),
                    ));
                }
                if currency.trim().is_empty() {
                    return Err(AppError::Validation(
                        "currency is required for price goals".to_string(),
                    ));
                }
            }
            GoalKind::Headcount { goal } => {
                if *goal <= 0 {
                    return Err(AppError::Validation(
                        "goal must be a positive number of collaborators".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Raw `projects` row as stored in PostgreSQL.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub id_user: i64,
    pub id_category: i64,
    pub title: String,
    pub description: String,
    pub goal_type: String,
    pub price_goal: Option<f64>,
    pub currency: Option<String>,
    pub coll_goal: Option<i32>,
    pub deadline_date: NaiveDate,
    pub about: Option<String>,
    pub cover: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub id_user: i64,
    pub id_category: i64,
    pub title: String,
    pub description: String,
    #[serde(flatten)]
    pub goal: GoalKind,
    pub deadline_date: NaiveDate,
    pub about: Option<String>,
    pub cover: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = AppError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let goal = match (row.goal_type.as_str(), row.price_goal, row.currency, row.coll_goal) {
            (GOAL_TYPE_PRICE, Some(goal), Some(currency), None) => {
                GoalKind::Monetary { goal, currency }
            }
            (GOAL_TYPE_COLLABORATORS, None, None, Some(goal)) => GoalKind::Headcount { goal },
            (other, ..) => {
                return Err(AppError::Internal(format!(
                    "Project {} has an inconsistent goal of type '{other}'",
                    row.id
                )))
            }
        };

        Ok(Self {
            id: row.id,
            id_user: row.id_user,
            id_category: row.id_category,
            title: row.title,
            description: row.description,
            goal,
            deadline_date: row.deadline_date,
            about: row.about,
            cover: row.cover,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Project enriched with its engagement summary, as returned by every feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFeedItem {
    #[serde(flatten)]
    pub project: Project,
    pub stats: ProjectSummary,
    pub percentage_done: i64,
}

/// Body of project create and update requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub id_category: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub goal: GoalKind,
    pub deadline_date: NaiveDate,
    pub about: Option<String>,
    pub cover: Option<String>,
}

impl ProjectInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(AppError::Validation(
                "title and description are required".to_string(),
            ));
        }
        self.goal.validate()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProject {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(goal_type: &str, price: Option<f64>, currency: Option<&str>, coll: Option<i32>) -> ProjectRow {
        ProjectRow {
            id: 1,
            id_user: 2,
            id_category: 3,
            title: "Solar kiosk".into(),
            description: "Off-grid charging".into(),
            goal_type: goal_type.into(),
            price_goal: price,
            currency: currency.map(String::from),
            coll_goal: coll,
            deadline_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            about: None,
            cover: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn monetary_row_converts() {
        let project = Project::try_from(row("price", Some(1000.0), Some("USD"), None)).unwrap();
        assert_eq!(
            project.goal,
            GoalKind::Monetary {
                goal: 1000.0,
                currency: "USD".into()
            }
        );
    }

    #[test]
    fn headcount_row_converts() {
        let project = Project::try_from(row("collaborators", None, None, Some(10))).unwrap();
        assert_eq!(project.goal, GoalKind::Headcount { goal: 10 });
    }

    #[test]
    fn mixed_goal_columns_are_rejected() {
        assert!(Project::try_from(row("price", Some(1.0), Some("EUR"), Some(4))).is_err());
        assert!(Project::try_from(row("collaborators", None, None, None)).is_err());
        assert!(Project::try_from(row("barter", None, None, Some(1))).is_err());
    }

    #[test]
    fn project_serializes_goal_inline() {
        let project = Project::try_from(row("price", Some(250.0), Some("EUR"), None)).unwrap();
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["typeGoal"], "price");
        assert_eq!(json["goal"], 250.0);
        assert_eq!(json["currency"], "EUR");
        assert_eq!(json["idUser"], 2);
    }

    #[test]
    fn input_parses_price_goal() {
        let input: ProjectInput = serde_json::from_value(serde_json::json!({
            "idCategory": 1,
            "title": "testProject",
            "description": "description testProject...",
            "goal": 1000,
            "typeGoal": "price",
            "deadlineDate": "2030-12-31",
            "currency": "USD"
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(input.goal.goal_type(), "price");
        assert_eq!(input.goal.columns(), (Some(1000.0), Some("USD"), None));
    }

    #[test]
    fn input_rejects_empty_title_and_bad_goals() {
        let mut input: ProjectInput = serde_json::from_value(serde_json::json!({
            "idCategory": 1,
            "title": "",
            "description": "d",
            "goal": 5,
            "typeGoal": "collaborators",
            "deadlineDate": "2030-12-31"
        }))
        .unwrap();
        assert!(input.validate().is_err());

        input.title = "t".into();
        assert!(input.validate().is_ok());

        input.goal = GoalKind::Headcount { goal: 0 };
        assert!(input.validate().is_err());

        input.goal = GoalKind::Monetary {
            goal: 10.0,
            currency: " ".into(),
        };
        assert!(input.validate().is_err());
    }
}
