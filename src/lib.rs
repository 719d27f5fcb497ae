pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use mongodb::Database;
use sqlx::PgPool;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Users, categories and projects.
    pub db: PgPool,
    /// Engagement stats, blogs, tiers, reviews, images and follows.
    pub docs: Database,
    pub http: reqwest::Client,
    pub config: config::AppConfig,
}
