use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{error_response, UserSummary};
use crate::auth::Claims;
use crate::domain::DomainError;
use crate::models::{like, movie, user, view};
use crate::services::engagement_service;

const DEFAULT_PAGE_SIZE: u64 = 24; // 4 rows x 6 columns in the web UI
const MAX_PAGE_SIZE: u64 = 100;

#[derive(Serialize)]
pub struct MovieDto {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub release_year: i32,
    pub genre: String,
    pub poster_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: Option<UserSummary>,
    // Calculated for the current viewer (false when anonymous)
    pub is_liked: bool,
    pub is_viewed: bool,
}

/// Build the response shape for a movie, resolving the creator and the
/// viewer's like/view flags.
pub(crate) async fn movie_dto<C: ConnectionTrait>(
    conn: &C,
    model: movie::Model,
    viewer: Option<i32>,
) -> Result<MovieDto, DomainError> {
    let created_by = match model.created_by {
        Some(uid) => user::Entity::find_by_id(uid)
            .one(conn)
            .await?
            .map(UserSummary::from),
        None => None,
    };

    let (is_liked, is_viewed) = match viewer {
        Some(uid) => {
            let liked = like::Entity::find()
                .filter(like::Column::UserId.eq(uid))
                .filter(like::Column::MovieId.eq(model.id))
                .one(conn)
                .await?
                .is_some();
            let viewed = view::Entity::find()
                .filter(view::Column::UserId.eq(uid))
                .filter(view::Column::MovieId.eq(model.id))
                .one(conn)
                .await?
                .is_some();
            (liked, viewed)
        }
        None => (false, false),
    };

    Ok(MovieDto {
        id: model.id,
        title: model.title,
        description: model.description,
        release_year: model.release_year,
        genre: model.genre,
        poster_url: model.poster_url,
        created_at: model.created_at,
        updated_at: model.updated_at,
        created_by,
        is_liked,
        is_viewed,
    })
}

#[derive(Deserialize)]
pub struct MovieListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub search: Option<String>,
}

pub async fn list_movies(
    State(db): State<DatabaseConnection>,
    claims: Option<Claims>,
    Query(query): Query<MovieListQuery>,
) -> impl IntoResponse {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let mut select = movie::Entity::find().order_by_desc(movie::Column::CreatedAt);
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(movie::Column::Title.contains(search));
    }

    let paginator = select.paginate(&db, page_size);

    let total = match paginator.num_items().await {
        Ok(total) => total,
        Err(e) => return error_response(e.into()),
    };

    let movies = match paginator.fetch_page(page - 1).await {
        Ok(movies) => movies,
        Err(e) => return error_response(e.into()),
    };

    let viewer = claims.map(|c| c.uid);
    let mut dtos = Vec::new();
    for model in movies {
        match movie_dto(&db, model, viewer).await {
            Ok(dto) => dtos.push(dto),
            Err(e) => return error_response(e),
        }
    }

    (
        StatusCode::OK,
        Json(json!({
            "movies": dtos,
            "total": total,
            "page": page,
            "page_size": page_size
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct CreateMovieRequest {
    pub title: String,
    pub description: String,
    pub release_year: i32,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

pub async fn create_movie(
    State(db): State<DatabaseConnection>,
    claims: Option<Claims>,
    Json(payload): Json<CreateMovieRequest>,
) -> impl IntoResponse {
    if payload.title.trim().is_empty() {
        return error_response(DomainError::Validation("title is required".to_string()));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let viewer = claims.map(|c| c.uid);

    let new_movie = movie::ActiveModel {
        title: Set(payload.title),
        description: Set(payload.description),
        release_year: Set(payload.release_year),
        genre: Set(payload.genre.unwrap_or_default()),
        poster_url: Set(payload.poster_url.unwrap_or_default()),
        created_by: Set(viewer),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = match new_movie.insert(&db).await {
        Ok(created) => created,
        Err(e) => return error_response(e.into()),
    };

    match movie_dto(&db, created, viewer).await {
        Ok(dto) => (StatusCode::CREATED, Json(dto)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_movie(
    State(db): State<DatabaseConnection>,
    claims: Option<Claims>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let found = match movie::Entity::find_by_id(id).one(&db).await {
        Ok(Some(found)) => found,
        Ok(None) => return error_response(DomainError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    match movie_dto(&db, found, claims.map(|c| c.uid)).await {
        Ok(dto) => (StatusCode::OK, Json(dto)).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct UpdateMovieRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub release_year: Option<i32>,
    pub genre: Option<String>,
    pub poster_url: Option<String>,
}

fn can_modify(claims: &Claims, target: &movie::Model) -> bool {
    claims.is_admin() || target.created_by == Some(claims.uid)
}

pub async fn update_movie(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateMovieRequest>,
) -> impl IntoResponse {
    let found = match movie::Entity::find_by_id(id).one(&db).await {
        Ok(Some(found)) => found,
        Ok(None) => return error_response(DomainError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    if !can_modify(&claims, &found) {
        return error_response(DomainError::Forbidden(
            "Only the creator or an admin can modify this movie".to_string(),
        ));
    }

    let mut active: movie::ActiveModel = found.into();
    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return error_response(DomainError::Validation("title is required".to_string()));
        }
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(release_year) = payload.release_year {
        active.release_year = Set(release_year);
    }
    if let Some(genre) = payload.genre {
        active.genre = Set(genre);
    }
    if let Some(poster_url) = payload.poster_url {
        active.poster_url = Set(poster_url);
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    let updated = match active.update(&db).await {
        Ok(updated) => updated,
        Err(e) => return error_response(e.into()),
    };

    match movie_dto(&db, updated, Some(claims.uid)).await {
        Ok(dto) => (StatusCode::OK, Json(dto)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_movie(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let found = match movie::Entity::find_by_id(id).one(&db).await {
        Ok(Some(found)) => found,
        Ok(None) => return error_response(DomainError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    if !can_modify(&claims, &found) {
        return error_response(DomainError::Forbidden(
            "Only the creator or an admin can delete this movie".to_string(),
        ));
    }

    match movie::Entity::delete_by_id(id).exec(&db).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e.into()),
    }
}

pub async fn toggle_like(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (state, target) = match engagement_service::toggle_like(&db, claims.uid, id).await {
        Ok(result) => result,
        Err(e) => return error_response(e),
    };

    match movie_dto(&db, target, Some(claims.uid)).await {
        Ok(dto) => (
            StatusCode::OK,
            Json(json!({ "status": state.as_str(), "movie": dto })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn toggle_view(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let (state, target) = match engagement_service::toggle_view(&db, claims.uid, id).await {
        Ok(result) => result,
        Err(e) => return error_response(e),
    };

    match movie_dto(&db, target, Some(claims.uid)).await {
        Ok(dto) => (
            StatusCode::OK,
            Json(json!({ "status": state.as_str(), "movie": dto })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
