use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::movies::{movie_dto, MovieDto};
use crate::api::error_response;
use crate::auth::Claims;
use crate::domain::DomainError;
use crate::models::{list, movie, movie_in_list};
use crate::services::list_service::{self, CreateListInput};

/// Response shape for list overviews.
#[derive(Serialize)]
pub struct ListSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: i32,
    pub is_public: bool,
    pub is_system: bool,
    pub created_at: String,
    pub updated_at: String,
    pub movies_count: u64,
}

impl ListSummary {
    fn new(model: list::Model, movies_count: u64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_by: model.created_by,
            is_public: model.is_public,
            is_system: model.is_system,
            created_at: model.created_at,
            updated_at: model.updated_at,
            movies_count,
        }
    }
}

#[derive(Serialize)]
pub struct ListEntryDto {
    pub movie: MovieDto,
    pub note: String,
    pub added_at: String,
}

/// Response shape for a single list, with its membership entries. Selected
/// explicitly by the detail handler; not a variant of `ListSummary`.
#[derive(Serialize)]
pub struct ListDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: i32,
    pub is_public: bool,
    pub is_system: bool,
    pub created_at: String,
    pub updated_at: String,
    pub movies: Vec<ListEntryDto>,
}

async fn count_movies(db: &DatabaseConnection, list_id: &str) -> Result<u64, DomainError> {
    let count = movie_in_list::Entity::find()
        .filter(movie_in_list::Column::ListId.eq(list_id))
        .count(db)
        .await?;

    Ok(count)
}

pub async fn list_lists(
    State(db): State<DatabaseConnection>,
    claims: Claims,
) -> impl IntoResponse {
    let lists = match list::Entity::find()
        .filter(list::Column::CreatedBy.eq(claims.uid))
        .order_by_desc(list::Column::CreatedAt)
        .all(&db)
        .await
    {
        Ok(lists) => lists,
        Err(e) => return error_response(e.into()),
    };

    let mut dtos = Vec::new();
    for model in lists {
        let count = match count_movies(&db, &model.id).await {
            Ok(count) => count,
            Err(e) => return error_response(e),
        };
        dtos.push(ListSummary::new(model, count));
    }

    (StatusCode::OK, Json(dtos)).into_response()
}

#[derive(Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

pub async fn create_list(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<CreateListRequest>,
) -> impl IntoResponse {
    let input = CreateListInput {
        name: payload.name,
        description: payload.description,
        is_public: payload.is_public,
    };

    match list_service::create_list(&db, claims.uid, input).await {
        Ok(created) => (StatusCode::CREATED, Json(ListSummary::new(created, 0))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_list(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let found = match list_service::find_owned_list(&db, claims.uid, &id).await {
        Ok(found) => found,
        Err(e) => return error_response(e),
    };

    let entries = match movie_in_list::Entity::find()
        .filter(movie_in_list::Column::ListId.eq(&found.id))
        .order_by_desc(movie_in_list::Column::AddedAt)
        .all(&db)
        .await
    {
        Ok(entries) => entries,
        Err(e) => return error_response(e.into()),
    };

    let mut movies = Vec::new();
    for entry in entries {
        // Fetch movie details for each entry (N+1 query for now)
        let found_movie = match movie::Entity::find_by_id(entry.movie_id).one(&db).await {
            Ok(Some(found_movie)) => found_movie,
            Ok(None) => continue,
            Err(e) => return error_response(e.into()),
        };

        match movie_dto(&db, found_movie, Some(claims.uid)).await {
            Ok(dto) => movies.push(ListEntryDto {
                movie: dto,
                note: entry.note,
                added_at: entry.added_at,
            }),
            Err(e) => return error_response(e),
        }
    }

    let detail = ListDetail {
        id: found.id,
        name: found.name,
        description: found.description,
        created_by: found.created_by,
        is_public: found.is_public,
        is_system: found.is_system,
        created_at: found.created_at,
        updated_at: found.updated_at,
        movies,
    };

    (StatusCode::OK, Json(detail)).into_response()
}

#[derive(Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

pub async fn update_list(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<String>,
    Json(payload): Json<UpdateListRequest>,
) -> impl IntoResponse {
    let found = match list_service::find_owned_list(&db, claims.uid, &id).await {
        Ok(found) => found,
        Err(e) => return error_response(e),
    };

    let mut active: list::ActiveModel = found.clone().into();

    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return error_response(DomainError::Validation("name is required".to_string()));
        }

        if name != found.name {
            let duplicate = match list::Entity::find()
                .filter(list::Column::Name.eq(&name))
                .filter(list::Column::CreatedBy.eq(claims.uid))
                .filter(list::Column::Id.ne(&found.id))
                .one(&db)
                .await
            {
                Ok(duplicate) => duplicate,
                Err(e) => return error_response(e.into()),
            };

            if duplicate.is_some() {
                return error_response(DomainError::Conflict(
                    "A list with this name already exists".to_string(),
                ));
            }
            active.name = Set(name);
        }
    }

    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_public) = payload.is_public {
        active.is_public = Set(is_public);
    }
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    let updated = match active.update(&db).await {
        Ok(updated) => updated,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return error_response(DomainError::Conflict(
                "A list with this name already exists".to_string(),
            ));
        }
        Err(e) => return error_response(e.into()),
    };

    let count = match count_movies(&db, &updated.id).await {
        Ok(count) => count,
        Err(e) => return error_response(e),
    };

    (StatusCode::OK, Json(ListSummary::new(updated, count))).into_response()
}

pub async fn delete_list(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let found = match list_service::find_owned_list(&db, claims.uid, &id).await {
        Ok(found) => found,
        Err(e) => return error_response(e),
    };

    match found.delete(&db).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e.into()),
    }
}

#[derive(Deserialize)]
pub struct AddMovieRequest {
    pub movie_id: Option<i32>,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn add_movie(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<String>,
    Json(payload): Json<AddMovieRequest>,
) -> impl IntoResponse {
    let Some(movie_id) = payload.movie_id else {
        return error_response(DomainError::Validation("movie_id is required".to_string()));
    };

    match list_service::add_movie(&db, claims.uid, &id, movie_id, payload.note).await {
        Ok(entry) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Movie added to list",
                "entry": entry
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct RemoveMovieRequest {
    pub movie_id: Option<i32>,
}

pub async fn remove_movie(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Path(id): Path<String>,
    Json(payload): Json<RemoveMovieRequest>,
) -> impl IntoResponse {
    let Some(movie_id) = payload.movie_id else {
        return error_response(DomainError::Validation("movie_id is required".to_string()));
    };

    match list_service::remove_movie(&db, claims.uid, &id, movie_id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "success" }))).into_response(),
        Err(e) => error_response(e),
    }
}
