pub mod auth;
pub mod health;
pub mod lists;
pub mod movies;
pub mod profile;
pub mod reviews;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::domain::DomainError;
use crate::models::user;
use crate::state::AppState;

/// Map a domain error to its HTTP response. Storage and external failures
/// become a generic 500; the detail only goes to the log.
pub(crate) fn error_response(err: DomainError) -> Response {
    let (status, message) = match &err {
        DomainError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        DomainError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        DomainError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        DomainError::Database(_) | DomainError::External(_) => {
            tracing::error!("request failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error. Please try again later.".to_string(),
            )
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}

/// Public shape of a user inside other responses.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
}

impl From<user::Model> for UserSummary {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
        }
    }
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::get_me))
        .route("/profile", patch(profile::update_profile))
        // Movies
        .route(
            "/movies",
            get(movies::list_movies).post(movies::create_movie),
        )
        .route(
            "/movies/:id",
            get(movies::get_movie)
                .put(movies::update_movie)
                .delete(movies::delete_movie),
        )
        // Engagement
        .route("/movies/:id/like", post(movies::toggle_like))
        .route("/movies/:id/view", post(movies::toggle_view))
        // Reviews & moderation
        .route("/movies/:id/reviews", get(reviews::list_reviews))
        .route("/movies/:id/add_review", post(reviews::add_review))
        .route("/movies/:id/update_review", put(reviews::update_review))
        .route("/movies/:id/delete_review", delete(reviews::delete_review))
        .route("/movies/:id/report_review", post(reviews::report_review))
        .route("/movies/:id/reports", get(reviews::list_reports))
        .route(
            "/movies/:id/reported_reviews",
            get(reviews::list_reported_reviews),
        )
        .route("/reported_reviews", get(reviews::list_all_reported_reviews))
        // Lists
        .route("/lists", get(lists::list_lists).post(lists::create_list))
        .route(
            "/lists/:id",
            get(lists::get_list)
                .put(lists::update_list)
                .delete(lists::delete_list),
        )
        .route("/lists/:id/add_movie", post(lists::add_movie))
        .route("/lists/:id/remove_movie", post(lists::remove_movie))
        .with_state(state)
}
