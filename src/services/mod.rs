//! Business logic services.

pub mod auth;
pub mod blogs;
pub mod categories;
pub mod follows;
pub mod images;
pub mod mail;
pub mod projects;
pub mod reviews;
pub mod stats;
pub mod tiers;
pub mod uploads;
pub mod users;
