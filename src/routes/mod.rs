//! Route definitions for the fundflow API.

pub mod auth;
pub mod blogs;
pub mod categories;
pub mod follows;
pub mod health;
pub mod images;
pub mod projects;
pub mod reviews;
pub mod stats;
pub mod tiers;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::middleware::auth::resolve_identity;
use crate::services::uploads::MAX_UPLOAD_BYTES;
use crate::AppState;

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/login/google", post(auth::google_login))
        .route("/auth/verifyEmail", post(auth::request_email_verification))
        .route("/auth/verifyEmail/{token}", get(auth::verify_email))
        .route("/auth/recoverPassword", post(auth::recover_password))
        .route("/auth/resetPassword", post(auth::reset_password))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(users::me).put(users::update).delete(users::delete_me),
        )
        .route("/users/byId/{id}", get(users::get_by_id))
        .route("/users/search/user", get(users::search))
        .route("/users/admin/panel", get(users::admin_panel))
        .route("/users/changePassword", put(users::change_password))
        .route("/users/profilePicture", put(users::update_profile_picture))
        .route("/users/profileCover", put(users::update_profile_cover))
        // GET takes a url, DELETE a numeric id, in the same path position.
        .route(
            "/users/{url}",
            get(users::get_by_url).delete(users::delete_by_id),
        )
        .route("/users/{url}/profilePicture", get(users::profile_picture))
        .route("/users/{url}/profileBanner", get(users::profile_banner))
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::get_by_id).delete(categories::delete),
        )
}

fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects::list).post(projects::create))
        .route("/projects/random", get(projects::random))
        .route("/projects/search", get(projects::search))
        .route("/projects/byInterest", get(projects::by_interest))
        .route("/projects/byCategory/{id}", get(projects::by_category))
        .route("/projects/byUser/{id}", get(projects::by_user))
        .route(
            "/projects/stats/percentageViews",
            get(stats::percentage_views),
        )
        .route(
            "/projects/reviews/byUser/reviewing",
            get(reviews::reviewing),
        )
        .route("/projects/reviews/byUser/reviewed", get(reviews::reviewed))
        .route(
            "/projects/{id}",
            get(projects::get_by_id)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route(
            "/projects/{id}/stats",
            get(stats::summary)
                .post(stats::record_view)
                .put(stats::update),
        )
        .route("/projects/{id}/stats/views", put(stats::mark_viewed))
        .route(
            "/projects/{id}/blogs",
            get(blogs::list).post(blogs::create),
        )
        .route(
            "/projects/{id}/blogs/{blog_id}",
            put(blogs::update).delete(blogs::delete),
        )
        .route(
            "/projects/{id}/tiers",
            get(tiers::list).post(tiers::create),
        )
        .route(
            "/projects/{id}/tiers/{tier_id}",
            put(tiers::update).delete(tiers::delete),
        )
        .route("/projects/{id}/tiers/{tier_id}/image", get(tiers::image))
        .route("/projects/{id}/images", get(images::list))
        .route("/projects/{id}/image", post(images::upload))
        .route(
            "/projects/{id}/image/{image_id}",
            get(images::get).delete(images::delete),
        )
        .route(
            "/projects/{id}/reviews",
            get(reviews::list).post(reviews::create),
        )
        .route(
            "/projects/{id}/reviews/{review_id}",
            axum::routing::delete(reviews::delete),
        )
}

fn follow_routes() -> Router<AppState> {
    Router::new()
        .route("/follows/follow", post(follows::follow))
        .route(
            "/follows/unfollow",
            axum::routing::delete(follows::unfollow),
        )
        .route("/follows/{user_url}/followers", get(follows::followers))
        .route("/follows/{user_url}/following", get(follows::following))
        .route(
            "/follows/{user_url}/isFollowing/{target_url}",
            get(follows::is_following),
        )
}

/// Build the complete application router.
///
/// Every request passes identity resolution first, so a bad token is
/// rejected with 401 even on public routes.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .merge(auth_routes())
        .merge(user_routes())
        .merge(category_routes())
        .merge(project_routes())
        .merge(follow_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            resolve_identity,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
