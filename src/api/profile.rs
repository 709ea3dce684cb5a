use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::auth::{hash_password, verify_password, Claims};
use crate::domain::DomainError;
use crate::models::user;

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn update_profile(
    State(db): State<DatabaseConnection>,
    claims: Claims,
    Json(payload): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let account = match user::Entity::find_by_id(claims.uid).one(&db).await {
        Ok(Some(account)) => account,
        Ok(None) => return error_response(DomainError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    let mut active: user::ActiveModel = account.clone().into();

    if let Some(username) = payload.username {
        let username = username.trim().to_string();
        if !username.is_empty() && username != account.username {
            let taken = match user::Entity::find()
                .filter(user::Column::Username.eq(&username))
                .filter(user::Column::Id.ne(account.id))
                .one(&db)
                .await
            {
                Ok(found) => found.is_some(),
                Err(e) => return error_response(e.into()),
            };

            if taken {
                return error_response(DomainError::Conflict(
                    "This username is already taken".to_string(),
                ));
            }
            active.username = Set(username);
        }
    }

    if let Some(new_password) = payload.new_password {
        let Some(current_password) = payload.current_password else {
            return error_response(DomainError::Validation(
                "current password is required to set a new one".to_string(),
            ));
        };

        match verify_password(&current_password, &account.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                return error_response(DomainError::Validation(
                    "current password is incorrect".to_string(),
                ));
            }
            Err(e) => return error_response(DomainError::Database(e)),
        }

        if new_password.len() < 8 {
            return error_response(DomainError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }

        match hash_password(&new_password) {
            Ok(hash) => active.password_hash = Set(hash),
            Err(e) => return error_response(DomainError::Database(e)),
        }
    }

    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    match active.update(&db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(json!({
                "username": updated.username,
                "message": "Profile updated successfully"
            })),
        )
            .into_response(),
        Err(e) => error_response(e.into()),
    }
}
