//! Engagement statistics: per-project summaries, the funding percentage, and
//! the create-on-view / evaluate / fund / collaborate mutations.

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};

use crate::db::PROJECT_STATS;
use crate::errors::AppError;
use crate::models::engagement::{
    CategoryViewShare, EngagementRecord, ProjectSummary, UpdateEngagement, ViewOutcome,
};
use crate::models::project::GoalKind;

fn records(docs: &Database) -> Collection<EngagementRecord> {
    docs.collection(PROJECT_STATS)
}

/// Server-side fold of a project's engagement records into one document.
fn summary_pipeline(project_id: i64) -> Vec<Document> {
    let flag = |field: &str| doc! { "$sum": { "$cond": [{ "$eq": [field, true] }, 1, 0] } };
    vec![
        doc! { "$match": { "projectId": project_id } },
        doc! { "$group": {
            "_id": null,
            "views": flag("$viewed"),
            "likes": flag("$liked"),
            "dislikes": flag("$disliked"),
            "collaborators": flag("$isCollaborator"),
            "funded": { "$sum": "$fundedAmount" },
        } },
    ]
}

/// Read the grouped document back. No group means no records: all zeros.
fn summary_from_group(grouped: Option<&Document>) -> ProjectSummary {
    let Some(d) = grouped else {
        return ProjectSummary::default();
    };
    ProjectSummary {
        views: group_count(d, "views").unwrap_or(0),
        likes: group_count(d, "likes").unwrap_or(0),
        dislikes: group_count(d, "dislikes").unwrap_or(0),
        collaborators: group_count(d, "collaborators").unwrap_or(0),
        funded: group_amount(d, "funded").unwrap_or(0.0),
    }
}

/// Engagement totals of a project, folded by the document store.
///
/// Projects without records yield an all-zero summary, never a not-found.
pub async fn summarize(docs: &Database, project_id: i64) -> Result<ProjectSummary, AppError> {
    let grouped: Vec<Document> = records(docs)
        .aggregate(summary_pipeline(project_id))
        .await?
        .try_collect()
        .await?;
    Ok(summary_from_group(grouped.first()))
}

/// Progress towards the project goal as a floored, unclamped percentage.
///
/// Headcount goals count collaborators, monetary goals count funds. Zero when
/// nothing has been funded or joined yet, or when the goal is not positive.
pub fn percentage(summary: &ProjectSummary, goal: &GoalKind) -> i64 {
    if summary.funded <= 0.0 && summary.collaborators <= 0 {
        return 0;
    }
    match goal {
        GoalKind::Headcount { goal } if *goal > 0 => {
            (100 * summary.collaborators) / i64::from(*goal)
        }
        GoalKind::Monetary { goal, .. } if *goal > 0.0 => {
            (100.0 * summary.funded / goal).floor() as i64
        }
        _ => 0,
    }
}

/// Create the caller's engagement record for a project on first view.
///
/// A second call is a successful no-op reported as "already viewed".
pub async fn record_view(
    docs: &Database,
    user_id: i64,
    project_id: i64,
    category_id: i64,
) -> Result<ViewOutcome, AppError> {
    let fresh = EngagementRecord::viewed(user_id, project_id, category_id);
    let insert = mongodb::bson::to_document(&fresh)
        .map_err(|e| AppError::Internal(format!("Failed to encode engagement record: {e}")))?;

    let result = records(docs)
        .update_one(
            doc! { "userId": user_id, "projectId": project_id },
            doc! { "$setOnInsert": insert },
        )
        .upsert(true)
        .await?;

    let created = result.upserted_id.is_some();
    if created {
        tracing::debug!(user_id, project_id, "Engagement record created");
    }
    Ok(ViewOutcome {
        created,
        message: if created {
            "Project stats created".to_string()
        } else {
            "Project already viewed".to_string()
        },
    })
}

/// Set `viewed` on the caller's existing record.
pub async fn mark_viewed(docs: &Database, user_id: i64, project_id: i64) -> Result<(), AppError> {
    let result = records(docs)
        .update_one(
            doc! { "userId": user_id, "projectId": project_id },
            doc! { "$set": { "viewed": true } },
        )
        .await?;
    if result.matched_count == 0 {
        return Err(AppError::NotFound("Project stats not found".to_string()));
    }
    Ok(())
}

/// Apply an evaluate/fund/collaborate request to the caller's record.
pub async fn update_engagement(
    docs: &Database,
    user_id: i64,
    project_id: i64,
    update: &UpdateEngagement,
) -> Result<EngagementRecord, AppError> {
    update.validate()?;
    let filter = doc! { "userId": user_id, "projectId": project_id };
    let collection = records(docs);

    let mut record = collection
        .find_one(filter.clone())
        .await?
        .ok_or_else(|| AppError::NotFound("Project stats not found".to_string()))?;
    record.apply(update);
    collection.replace_one(filter, &record).await?;

    tracing::debug!(user_id, project_id, "Engagement record updated");
    Ok(record)
}

/// Share of all recorded views per category, highest first.
pub async fn category_view_shares(docs: &Database) -> Result<Vec<CategoryViewShare>, AppError> {
    let pipeline = vec![
        doc! { "$match": { "viewed": true } },
        doc! { "$group": { "_id": "$categoryId", "views": { "$sum": 1 } } },
        doc! { "$sort": { "views": -1, "_id": 1 } },
    ];
    let grouped: Vec<Document> = records(docs).aggregate(pipeline).await?.try_collect().await?;

    let counts = grouped
        .iter()
        .filter_map(|d| Some((group_key(d)?, group_count(d, "views")?)))
        .collect::<Vec<_>>();
    if counts.is_empty() {
        return Err(AppError::NotFound("No view data found".to_string()));
    }
    Ok(view_shares(counts))
}

/// Turn `(category, views)` counts into two-decimal percentages of the total.
pub fn view_shares(counts: Vec<(i64, i64)>) -> Vec<CategoryViewShare> {
    let total: i64 = counts.iter().map(|(_, views)| views).sum();
    counts
        .into_iter()
        .map(|(id_category, views)| CategoryViewShare {
            id_category,
            views,
            percentage: if total == 0 {
                0.0
            } else {
                (views as f64 * 10_000.0 / total as f64).round() / 100.0
            },
        })
        .collect()
}

/// Categories the user has viewed, most viewed first.
pub async fn interest_categories(docs: &Database, user_id: i64) -> Result<Vec<i64>, AppError> {
    let pipeline = vec![
        doc! { "$match": { "userId": user_id, "viewed": true } },
        doc! { "$group": { "_id": "$categoryId", "views": { "$sum": 1 } } },
        doc! { "$sort": { "views": -1, "_id": 1 } },
    ];
    let grouped: Vec<Document> = records(docs).aggregate(pipeline).await?.try_collect().await?;
    Ok(grouped.iter().filter_map(group_key).collect())
}

/// Remove every engagement record of a project. Returns the number removed.
pub async fn purge_project(docs: &Database, project_id: i64) -> Result<u64, AppError> {
    let result = records(docs)
        .delete_many(doc! { "projectId": project_id })
        .await?;
    Ok(result.deleted_count)
}

/// Remove every engagement record left by a user.
pub async fn purge_user(docs: &Database, user_id: i64) -> Result<u64, AppError> {
    let result = records(docs).delete_many(doc! { "userId": user_id }).await?;
    Ok(result.deleted_count)
}

// Integers come back from `$group` as Int32 or Int64 depending on magnitude.
fn group_key(d: &Document) -> Option<i64> {
    group_count(d, "_id")
}

fn group_count(d: &Document, key: &str) -> Option<i64> {
    d.get_i64(key)
        .ok()
        .or_else(|| d.get_i32(key).ok().map(i64::from))
}

// `$sum` over doubles stays a double, but integer-only input sums to an integer.
fn group_amount(d: &Document, key: &str) -> Option<f64> {
    d.get_f64(key)
        .ok()
        .or_else(|| group_count(d, key).map(|n| n as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(funded: f64, collaborators: i64) -> ProjectSummary {
        ProjectSummary {
            funded,
            collaborators,
            ..Default::default()
        }
    }

    fn price(goal: f64) -> GoalKind {
        GoalKind::Monetary {
            goal,
            currency: "USD".into(),
        }
    }

    #[test]
    fn percentage_is_zero_without_engagement() {
        assert_eq!(percentage(&summary(0.0, 0), &price(1000.0)), 0);
        assert_eq!(percentage(&summary(0.0, 0), &GoalKind::Headcount { goal: 10 }), 0);
    }

    #[test]
    fn headcount_goal_uses_collaborators() {
        assert_eq!(percentage(&summary(0.0, 1), &GoalKind::Headcount { goal: 10 }), 10);
        // funds are ignored for headcount goals
        assert_eq!(percentage(&summary(900.0, 1), &GoalKind::Headcount { goal: 3 }), 33);
    }

    #[test]
    fn monetary_goal_uses_funds() {
        assert_eq!(percentage(&summary(250.0, 0), &price(1000.0)), 25);
        assert_eq!(percentage(&summary(999.0, 5), &price(1000.0)), 99);
    }

    #[test]
    fn percentage_is_not_clamped() {
        assert_eq!(percentage(&summary(2500.0, 0), &price(1000.0)), 250);
        assert_eq!(percentage(&summary(0.0, 12), &GoalKind::Headcount { goal: 10 }), 120);
    }

    #[test]
    fn non_positive_goal_yields_zero() {
        assert_eq!(percentage(&summary(10.0, 0), &price(0.0)), 0);
        assert_eq!(percentage(&summary(0.0, 2), &GoalKind::Headcount { goal: 0 }), 0);
    }

    #[test]
    fn collaborators_alone_count_on_monetary_goal_as_zero_funds() {
        assert_eq!(percentage(&summary(0.0, 3), &price(100.0)), 0);
    }

    #[test]
    fn view_shares_round_to_two_decimals() {
        let shares = view_shares(vec![(1, 2), (2, 1)]);
        assert_eq!(shares[0].percentage, 66.67);
        assert_eq!(shares[1].percentage, 33.33);
        assert_eq!(shares[0].views, 2);
    }

    #[test]
    fn view_shares_with_zero_total() {
        let shares = view_shares(vec![(4, 0)]);
        assert_eq!(shares[0].percentage, 0.0);
    }

    #[test]
    fn summary_pipeline_groups_one_project() {
        let pipeline = summary_pipeline(42);
        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline[0].get_document("$match").unwrap().get_i64("projectId").unwrap(),
            42
        );
        let group = pipeline[1].get_document("$group").unwrap();
        for key in ["views", "likes", "dislikes", "collaborators", "funded"] {
            assert!(group.contains_key(key), "missing accumulator {key}");
        }
    }

    #[test]
    fn grouped_document_maps_to_summary() {
        let d = doc! {
            "_id": null,
            "views": 3_i32,
            "likes": 2_i32,
            "dislikes": 1_i64,
            "collaborators": 1_i32,
            "funded": 250.5,
        };
        assert_eq!(
            summary_from_group(Some(&d)),
            ProjectSummary {
                views: 3,
                likes: 2,
                dislikes: 1,
                funded: 250.5,
                collaborators: 1,
            }
        );
    }

    #[test]
    fn integer_funds_and_missing_group_are_handled() {
        let d = doc! { "views": 1_i32, "funded": 40_i32 };
        let summary = summary_from_group(Some(&d));
        assert_eq!(summary.funded, 40.0);
        assert_eq!(summary.likes, 0);
        assert_eq!(summary_from_group(None), ProjectSummary::default());
    }

    #[test]
    fn group_values_accept_both_integer_widths() {
        let d = doc! { "_id": 7_i64, "views": 3_i32 };
        assert_eq!(group_key(&d), Some(7));
        assert_eq!(group_count(&d, "views"), Some(3));
    }
}
