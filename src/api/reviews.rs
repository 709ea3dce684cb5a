use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{error_response, UserSummary};
use crate::auth::Claims;
use crate::domain::DomainError;
use crate::models::{report, review, user};
use crate::services::review_service::{self, ReportOutcome};

#[derive(Serialize)]
pub struct ReviewDto {
    pub id: i32,
    pub user: Option<UserSummary>,
    pub movie_id: i32,
    pub rating: i32,
    pub comment: String,
    pub is_reported: bool,
    pub report_count: i32,
    pub created_at: String,
}

impl ReviewDto {
    fn from_pair((model, author): (review::Model, Option<user::Model>)) -> Self {
        Self {
            id: model.id,
            user: author.map(UserSummary::from),
            movie_id: model.movie_id,
            rating: model.rating,
            comment: model.comment,
            is_reported: model.is_reported,
            report_count: model.report_count,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ReportDto {
    pub user: Option<UserSummary>,
    pub review_id: i32,
    pub reason: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl ReportDto {
    fn from_pair((model, reporter): (report::Model, Option<user::Model>)) -> Self {
        Self {
            user: reporter.map(UserSummary::from),
            review_id: model.review_id,
            reason: model.reason,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

pub async fn list_reviews(
    State(db): State<DatabaseConnection>,
    Path(movie_id): Path<i32>,
) -> impl IntoResponse {
    match review_service::list_reviews(&db, movie_id).await {
        Ok(reviews) => {
            let dtos: Vec<ReviewDto> = reviews.into_iter().map(ReviewDto::from_pair).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

pub async fn add_review(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(movie_id): Path<i32>,
    Json(payload): Json<ReviewRequest>,
) -> impl IntoResponse {
    let Some(rating) = payload.rating else {
        return error_response(DomainError::Validation("rating is required".to_string()));
    };

    let comment = payload.comment.unwrap_or_default();

    match review_service::add_review(&db, claims.uid, movie_id, rating, comment).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Review added successfully",
                "review": created
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_review(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(movie_id): Path<i32>,
    Json(payload): Json<ReviewRequest>,
) -> impl IntoResponse {
    let Some(rating) = payload.rating else {
        return error_response(DomainError::Validation("rating is required".to_string()));
    };

    let comment = payload.comment.unwrap_or_default();

    match review_service::update_review(&db, claims.uid, movie_id, rating, comment).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(json!({
                "message": "Review updated successfully",
                "review": updated
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct DeleteReviewQuery {
    pub review_id: Option<i32>,
}

pub async fn delete_review(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(movie_id): Path<i32>,
    Query(query): Query<DeleteReviewQuery>,
) -> impl IntoResponse {
    match review_service::delete_review(
        &db,
        claims.uid,
        claims.is_admin(),
        movie_id,
        query.review_id,
    )
    .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ReportReviewRequest {
    pub review_id: Option<i32>,
    pub reason: Option<String>,
    pub description: Option<String>,
}

pub async fn report_review(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(movie_id): Path<i32>,
    Json(payload): Json<ReportReviewRequest>,
) -> impl IntoResponse {
    let Some(review_id) = payload.review_id else {
        return error_response(DomainError::Validation("review_id is required".to_string()));
    };
    let Some(reason) = payload.reason.filter(|r| !r.trim().is_empty()) else {
        return error_response(DomainError::Validation("reason is required".to_string()));
    };

    match review_service::report_review(
        &db,
        claims.uid,
        movie_id,
        review_id,
        reason,
        payload.description,
    )
    .await
    {
        // Distinct response so the client can refresh the list instead of
        // bumping a counter.
        Ok(ReportOutcome::AutoDeleted) => (
            StatusCode::OK,
            Json(json!({
                "message": "Review deleted automatically after reaching the report threshold"
            })),
        )
            .into_response(),
        Ok(ReportOutcome::Accepted(created)) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Report submitted",
                "report": created
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct ListReportsQuery {
    pub review_id: Option<i32>,
}

pub async fn list_reports(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(movie_id): Path<i32>,
    Query(query): Query<ListReportsQuery>,
) -> impl IntoResponse {
    if !claims.is_admin() {
        return error_response(DomainError::Forbidden(
            "Only admins can view reports".to_string(),
        ));
    }

    let Some(review_id) = query.review_id else {
        return error_response(DomainError::Validation("review_id is required".to_string()));
    };

    match review_service::list_reports(&db, movie_id, review_id).await {
        Ok(reports) => {
            let dtos: Vec<ReportDto> = reports.into_iter().map(ReportDto::from_pair).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn list_reported_reviews(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(movie_id): Path<i32>,
) -> impl IntoResponse {
    if !claims.is_admin() {
        return error_response(DomainError::Forbidden(
            "Only admins can view reported reviews".to_string(),
        ));
    }

    match review_service::list_reported_reviews(&db, movie_id).await {
        Ok(reviews) => {
            let dtos: Vec<ReviewDto> = reviews.into_iter().map(ReviewDto::from_pair).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn list_all_reported_reviews(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> impl IntoResponse {
    if !claims.is_admin() {
        return error_response(DomainError::Forbidden(
            "Only admins can view reported reviews".to_string(),
        ));
    }

    match review_service::list_all_reported_reviews(&db).await {
        Ok(reviews) => {
            let dtos: Vec<ReviewDto> = reviews.into_iter().map(ReviewDto::from_pair).collect();
            (StatusCode::OK, Json(dtos)).into_response()
        }
        Err(e) => error_response(e),
    }
}
