//! Seed script for development: populates fresh databases with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` and `JWT_SECRET` environment variables (reads .env).

use fundflow::config::AppConfig;
use fundflow::db;
use fundflow::models::engagement::{EngagementRecord, Evaluation, UpdateEngagement};
use fundflow::services::auth::{hash_password, url_slug};
use mongodb::bson::doc;
use mongodb::Database;
use sqlx::PgPool;

const ADMIN_PASSWORD: &str = "Admin123!";
const USER_PASSWORD: &str = "Creator123!";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pool = db::create_pool(&config.database_url, 5).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let docs = db::connect_documents(&config.mongodb_url, &config.mongodb_database).await?;
    db::ensure_indexes(&docs).await?;

    println!("=== fundflow Seed Script ===");

    let admin_id = seed_user(&pool, "admin", "admin@fundflow.local", ADMIN_PASSWORD, true).await?;
    let creator_id =
        seed_user(&pool, "Jane Creator", "jane@fundflow.local", USER_PASSWORD, false).await?;
    let categories = seed_categories(&pool).await?;
    let projects = seed_projects(&pool, creator_id, &categories).await?;
    seed_engagement(&docs, &[admin_id, creator_id], &projects).await?;

    println!("\n=== Seed complete! ===");
    println!("Admin login: admin / {ADMIN_PASSWORD}");
    println!("Creator login: Jane Creator / {USER_PASSWORD}");

    Ok(())
}

async fn seed_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password: &str,
    is_admin: bool,
) -> anyhow::Result<i64> {
    let hash = hash_password(password)?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    if let Some(id) = existing {
        sqlx::query("UPDATE users SET password_hash = $1, is_admin = $2 WHERE id = $3")
            .bind(&hash)
            .bind(is_admin)
            .bind(id)
            .execute(pool)
            .await?;
        println!("[done] Updated user {username}");
        return Ok(id);
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, email, url, password_hash, is_admin, verified_email)
         VALUES ($1, $2, $3, $4, $5, TRUE)
         RETURNING id",
    )
    .bind(username)
    .bind(email)
    .bind(url_slug(username))
    .bind(&hash)
    .bind(is_admin)
    .fetch_one(pool)
    .await?;

    println!("[done] Created user {username}");
    Ok(id)
}

async fn seed_categories(pool: &PgPool) -> anyhow::Result<Vec<i64>> {
    let names = ["Technology", "Art", "Community", "Education", "Environment"];
    let mut ids = Vec::with_capacity(names.len());

    for name in names {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name) VALUES ($1)
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(name)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }

    println!("[done] Ensured {} categories", ids.len());
    Ok(ids)
}

async fn seed_projects(pool: &PgPool, owner_id: i64, categories: &[i64]) -> anyhow::Result<Vec<(i64, i64)>> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        println!("[skip] Projects already exist ({count})");
        let existing: Vec<(i64, i64)> = sqlx::query_as("SELECT id, id_category FROM projects")
            .fetch_all(pool)
            .await?;
        return Ok(existing);
    }

    // (title, description, category index, price goal, collaborator goal)
    let samples: [(&str, &str, usize, Option<f64>, Option<i32>); 4] = [
        ("Solar Kiosk", "Off-grid phone charging for market stalls", 0, Some(5000.0), None),
        ("Mural Walk", "A painted trail through the old town", 1, Some(1200.0), None),
        ("Repair Café", "Monthly volunteer repair evenings", 2, None, Some(10)),
        ("Code Club", "After-school programming lessons", 3, None, Some(6)),
    ];

    let mut created = Vec::with_capacity(samples.len());
    for (title, description, category, price_goal, coll_goal) in samples {
        let category_id = categories[category % categories.len()];
        let (goal_type, currency) = if price_goal.is_some() {
            ("price", Some("EUR"))
        } else {
            ("collaborators", None)
        };

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO projects
                (id_user, id_category, title, description, goal_type, price_goal, currency,
                 coll_goal, deadline_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CURRENT_DATE + 90)
             RETURNING id",
        )
        .bind(owner_id)
        .bind(category_id)
        .bind(title)
        .bind(description)
        .bind(goal_type)
        .bind(price_goal)
        .bind(currency)
        .bind(coll_goal)
        .fetch_one(pool)
        .await?;
        created.push((id, category_id));
    }

    println!("[done] Created {} sample projects", created.len());
    Ok(created)
}

async fn seed_engagement(docs: &Database, users: &[i64], projects: &[(i64, i64)]) -> anyhow::Result<()> {
    let collection = docs.collection::<EngagementRecord>(db::PROJECT_STATS);

    for (n, &user_id) in users.iter().enumerate() {
        for &(project_id, category_id) in projects {
            let mut record = EngagementRecord::viewed(user_id, project_id, category_id);
            record.apply(&UpdateEngagement {
                evaluation: Some(if n % 2 == 0 { Evaluation::Likes } else { Evaluation::Dislikes }),
                fund: Some(25.0 * (n as f64 + 1.0)),
                collaboration: Some(n == 0),
            });
            collection
                .replace_one(doc! { "userId": user_id, "projectId": project_id }, &record)
                .upsert(true)
                .await?;
        }
    }

    println!("[done] Upserted engagement records for {} users", users.len());
    Ok(())
}
