//! Projects and the feeds built from them. Every feed item carries the
//! project's engagement summary and funding percentage.

use futures::future::try_join_all;
use mongodb::Database;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::pagination::Window;
use crate::models::project::{CreatedProject, Project, ProjectFeedItem, ProjectInput, ProjectRow};
use crate::services::{blogs, images, reviews, stats, tiers};

/// Attach stats to a single project.
pub async fn feed_item(docs: &Database, project: Project) -> Result<ProjectFeedItem, AppError> {
    let summary = stats::summarize(docs, project.id).await?;
    let percentage_done = stats::percentage(&summary, &project.goal);
    Ok(ProjectFeedItem {
        project,
        stats: summary,
        percentage_done,
    })
}

async fn into_feed(docs: &Database, rows: Vec<ProjectRow>) -> Result<Vec<ProjectFeedItem>, AppError> {
    let projects = rows
        .into_iter()
        .map(Project::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    try_join_all(projects.into_iter().map(|p| feed_item(docs, p))).await
}

/// Escape `LIKE` metacharacters and wrap the term for a substring match.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Latest projects first.
pub async fn list(pool: &PgPool, docs: &Database, window: Window) -> Result<Vec<ProjectFeedItem>, AppError> {
    let rows = sqlx::query_as::<_, ProjectRow>(
        "SELECT * FROM projects ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(window.limit)
    .bind(window.offset)
    .fetch_all(pool)
    .await?;
    into_feed(docs, rows).await
}

pub async fn by_category(
    pool: &PgPool,
    docs: &Database,
    category_id: i64,
    window: Window,
) -> Result<Vec<ProjectFeedItem>, AppError> {
    let rows = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT * FROM projects WHERE id_category = $1
        ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3
        "#,
    )
    .bind(category_id)
    .bind(window.limit)
    .bind(window.offset)
    .fetch_all(pool)
    .await?;
    into_feed(docs, rows).await
}

pub async fn by_user(
    pool: &PgPool,
    docs: &Database,
    user_id: i64,
    window: Window,
) -> Result<Vec<ProjectFeedItem>, AppError> {
    let rows = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT * FROM projects WHERE id_user = $1
        ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(window.limit)
    .bind(window.offset)
    .fetch_all(pool)
    .await?;
    into_feed(docs, rows).await
}

/// A random sample of `window.limit` projects. The offset is ignored.
pub async fn random(pool: &PgPool, docs: &Database, window: Window) -> Result<Vec<ProjectFeedItem>, AppError> {
    let rows = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects ORDER BY RANDOM() LIMIT $1")
        .bind(window.limit)
        .fetch_all(pool)
        .await?;
    into_feed(docs, rows).await
}

/// Case-insensitive substring search over title and description.
pub async fn search(
    pool: &PgPool,
    docs: &Database,
    term: &str,
    window: Window,
) -> Result<Vec<ProjectFeedItem>, AppError> {
    let rows = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT * FROM projects
        WHERE title ILIKE $1 OR description ILIKE $1
        ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3
        "#,
    )
    .bind(like_pattern(term))
    .bind(window.limit)
    .bind(window.offset)
    .fetch_all(pool)
    .await?;
    into_feed(docs, rows).await
}

/// Projects from the categories the user views most, in that order. Users
/// without any viewing history get the latest projects.
pub async fn by_interest(
    pool: &PgPool,
    docs: &Database,
    user_id: i64,
    window: Window,
) -> Result<Vec<ProjectFeedItem>, AppError> {
    let categories = stats::interest_categories(docs, user_id).await?;
    if categories.is_empty() {
        tracing::debug!(user_id, "No viewing history, falling back to latest projects");
        return list(pool, docs, window).await;
    }

    let rows = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT * FROM projects
        WHERE id_category = ANY($1)
        ORDER BY array_position($1, id_category), created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&categories)
    .bind(window.limit)
    .bind(window.offset)
    .fetch_all(pool)
    .await?;
    into_feed(docs, rows).await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Project, AppError> {
    let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Project::try_from(row)
}

fn map_write_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            AppError::Validation("Category does not exist".to_string())
        }
        _ => AppError::Database(e),
    }
}

pub async fn create(pool: &PgPool, owner_id: i64, input: &ProjectInput) -> Result<CreatedProject, AppError> {
    input.validate()?;
    let (price_goal, currency, coll_goal) = input.goal.columns();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO projects
            (id_user, id_category, title, description, goal_type, price_goal, currency,
             coll_goal, deadline_date, about, cover)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        "#,
    )
    .bind(owner_id)
    .bind(input.id_category)
    .bind(input.title.trim())
    .bind(input.description.trim())
    .bind(input.goal.goal_type())
    .bind(price_goal)
    .bind(currency)
    .bind(coll_goal)
    .bind(input.deadline_date)
    .bind(&input.about)
    .bind(&input.cover)
    .fetch_one(pool)
    .await
    .map_err(map_write_error)?;

    tracing::info!(project_id = id, owner_id, goal_type = input.goal.goal_type(), "Project created");
    Ok(CreatedProject { id })
}

pub async fn update(pool: &PgPool, id: i64, input: &ProjectInput) -> Result<Project, AppError> {
    input.validate()?;
    let (price_goal, currency, coll_goal) = input.goal.columns();

    let row = sqlx::query_as::<_, ProjectRow>(
        r#"
        UPDATE projects SET
            id_category = $1, title = $2, description = $3, goal_type = $4,
            price_goal = $5, currency = $6, coll_goal = $7, deadline_date = $8,
            about = $9, cover = $10, updated_at = NOW()
        WHERE id = $11
        RETURNING *
        "#,
    )
    .bind(input.id_category)
    .bind(input.title.trim())
    .bind(input.description.trim())
    .bind(input.goal.goal_type())
    .bind(price_goal)
    .bind(currency)
    .bind(coll_goal)
    .bind(input.deadline_date)
    .bind(&input.about)
    .bind(&input.cover)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(map_write_error)?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    Project::try_from(row)
}

/// Best-effort removal of every document hanging off a project. Failures are
/// logged and leave orphans behind; they never abort the caller.
pub async fn purge_documents(docs: &Database, project_id: i64) {
    let outcomes = [
        ("stats", stats::purge_project(docs, project_id).await),
        ("blogs", blogs::purge_project(docs, project_id).await),
        ("tiers", tiers::purge_project(docs, project_id).await),
        ("reviews", reviews::purge_project(docs, project_id).await),
        ("images", images::purge_project(docs, project_id).await),
    ];
    for (collection, outcome) in outcomes {
        match outcome {
            Ok(removed) => tracing::debug!(project_id, collection, removed, "Purged project documents"),
            Err(e) => tracing::warn!(
                project_id,
                collection,
                error = %e,
                "Failed to purge project documents, orphans left behind"
            ),
        }
    }
}

/// Two-phase delete: dependent documents first, then the relational row.
pub async fn delete(pool: &PgPool, docs: &Database, id: i64) -> Result<(), AppError> {
    purge_documents(docs, id).await;

    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    tracing::info!(project_id = id, "Project deleted");
    Ok(())
}

/// Ids of every project owned by a user.
pub async fn ids_owned_by(pool: &PgPool, user_id: i64) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM projects WHERE id_user = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_term() {
        assert_eq!(like_pattern("solar"), "%solar%");
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
