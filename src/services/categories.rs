//! Project categories.

use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::category::{Category, CreateCategory};

pub async fn list(pool: &PgPool) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(categories)
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Category, AppError> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))
}

pub async fn create(pool: &PgPool, input: &CreateCategory) -> Result<Category, AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Category name is required".to_string()));
    }

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name) VALUES ($1) RETURNING *",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(format!("Category '{name}' already exists"))
        }
        _ => AppError::Database(e),
    })?;

    tracing::info!(category_id = category.id, name, "Category created");
    Ok(category)
}

/// Delete a category. Categories still referenced by projects are kept.
pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::Conflict("Category is still used by projects".to_string())
            }
            _ => AppError::Database(e),
        })?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }
    Ok(())
}
