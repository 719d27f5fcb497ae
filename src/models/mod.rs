//! Database models and DTOs for all domain entities.

pub mod blog;
pub mod category;
pub mod engagement;
pub mod follow;
pub mod image;
pub mod pagination;
pub mod project;
pub mod review;
pub mod tier;
pub mod user;
