//! Request guards: identity resolution, login, admin and ownership checks.

pub mod auth;
pub mod json;
pub mod rbac;
