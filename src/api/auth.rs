use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::error_response;
use crate::auth::{create_jwt, hash_password, verify_password, Claims};
use crate::domain::DomainError;
use crate::models::{pending_user, user};
use crate::state::AppState;

fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Store a pending registration, then send the verification code. Explicit
/// sequential steps; the account only exists once the code is confirmed.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();

    if username.is_empty() {
        return error_response(DomainError::Validation("username is required".to_string()));
    }
    if !email.contains('@') {
        return error_response(DomainError::Validation(
            "a valid email address is required".to_string(),
        ));
    }
    if payload.password.len() < 8 {
        return error_response(DomainError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let db = &state.db;

    let email_taken = match user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await
    {
        Ok(found) => found.is_some(),
        Err(e) => return error_response(e.into()),
    };
    if email_taken {
        return error_response(DomainError::Conflict(
            "This email is already in use".to_string(),
        ));
    }

    let username_taken = match user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(db)
        .await
    {
        Ok(found) => found.is_some(),
        Err(e) => return error_response(e.into()),
    };
    if username_taken {
        return error_response(DomainError::Conflict(
            "This username is already taken".to_string(),
        ));
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(e) => return error_response(DomainError::Database(e)),
    };

    let code = generate_verification_code();
    let now = chrono::Utc::now().to_rfc3339();

    // Re-registering with the same email refreshes the pending record and
    // resends a new code.
    let existing = match pending_user::Entity::find()
        .filter(pending_user::Column::Email.eq(&email))
        .one(db)
        .await
    {
        Ok(existing) => existing,
        Err(e) => return error_response(e.into()),
    };

    let result = match existing {
        Some(found) => {
            let mut active: pending_user::ActiveModel = found.into();
            active.username = Set(username.clone());
            active.password_hash = Set(password_hash);
            active.verification_code = Set(code.clone());
            active.update(db).await.map(|_| ())
        }
        None => {
            let pending = pending_user::ActiveModel {
                email: Set(email.clone()),
                username: Set(username.clone()),
                password_hash: Set(password_hash),
                verification_code: Set(code.clone()),
                created_at: Set(now),
                ..Default::default()
            };
            pending.insert(db).await.map(|_| ())
        }
    };

    if let Err(e) = result {
        return error_response(e.into());
    }

    if let Err(e) = state.notifier.send_verification_email(&email, &code).await {
        tracing::warn!("failed to send verification email to {}: {}", email, e);
        return error_response(e);
    }

    tracing::info!("registration pending for {}", username);
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful. Check your email for the verification code."
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Promote a pending registration into a real account.
pub async fn verify_email(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<VerifyEmailRequest>,
) -> impl IntoResponse {
    let pending = match pending_user::Entity::find()
        .filter(pending_user::Column::Email.eq(payload.email.trim()))
        .one(&db)
        .await
    {
        Ok(Some(pending)) => pending,
        Ok(None) => return error_response(DomainError::NotFound),
        Err(e) => return error_response(e.into()),
    };

    if pending.verification_code != payload.code.trim() {
        return error_response(DomainError::Validation(
            "Invalid verification code".to_string(),
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let new_user = user::ActiveModel {
        username: Set(pending.username.clone()),
        email: Set(pending.email.clone()),
        password_hash: Set(pending.password_hash.clone()),
        role: Set("user".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = match new_user.insert(&db).await {
        Ok(created) => created,
        Err(e) => return error_response(e.into()),
    };

    if let Err(e) = pending.delete(&db).await {
        return error_response(e.into());
    }

    let token = match create_jwt(&created.username, created.id, &created.role) {
        Ok(token) => token,
        Err(e) => return error_response(DomainError::Database(e)),
    };

    tracing::info!("email verified for user {}", created.username);
    (
        StatusCode::OK,
        Json(json!({
            "message": "Email verified successfully",
            "token": token,
            "user": {
                "id": created.id,
                "username": created.username,
                "email": created.email
            }
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    tracing::info!("Login attempt for user: {}", payload.username);

    // The login field accepts a username or an email address.
    let by_username = user::Entity::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&db)
        .await;

    let found = match by_username {
        Ok(Some(found)) => Some(found),
        Ok(None) => {
            match user::Entity::find()
                .filter(user::Column::Email.eq(&payload.username))
                .one(&db)
                .await
            {
                Ok(found) => found,
                Err(e) => return error_response(e.into()),
            }
        }
        Err(e) => return error_response(e.into()),
    };

    let Some(account) = found else {
        tracing::warn!("User not found: {}", payload.username);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid credentials" })),
        )
            .into_response();
    };

    match verify_password(&payload.password, &account.password_hash) {
        Ok(true) => {
            let token = match create_jwt(&account.username, account.id, &account.role) {
                Ok(token) => token,
                Err(e) => return error_response(DomainError::Database(e)),
            };

            tracing::info!("Login successful for user: {}", account.username);
            (
                StatusCode::OK,
                Json(json!({
                    "token": token,
                    "user": {
                        "id": account.id,
                        "username": account.username,
                        "email": account.email
                    }
                })),
            )
                .into_response()
        }
        _ => {
            tracing::warn!("Password verification failed for user: {}", account.username);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response()
        }
    }
}

pub async fn get_me(State(db): State<DatabaseConnection>, claims: Claims) -> impl IntoResponse {
    match user::Entity::find_by_id(claims.uid).one(&db).await {
        Ok(Some(found)) => (
            StatusCode::OK,
            Json(json!({
                "id": found.id,
                "username": found.username,
                "email": found.email,
                "role": found.role
            })),
        )
            .into_response(),
        Ok(None) => error_response(DomainError::NotFound),
        Err(e) => error_response(e.into()),
    }
}
