//! Engagement engine: like/view toggles and their system-list mirrors.
//!
//! The engagement row is authoritative; the membership mirror is a derived
//! projection. Each toggle runs in one transaction so interleaved toggles on
//! the same (user, movie) pair serialize instead of racing.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::domain::DomainError;
use crate::models::{like, movie, view};
use crate::services::list_service::{self, SystemList};

const AUTO_NOTE: &str = "Added automatically";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
}

impl LikeToggle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeToggle::Liked => "liked",
            LikeToggle::Unliked => "unliked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewToggle {
    Viewed,
    Unviewed,
}

impl ViewToggle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewToggle::Viewed => "viewed",
            ViewToggle::Unviewed => "unviewed",
        }
    }
}

pub async fn toggle_like(
    db: &DatabaseConnection,
    user_id: i32,
    movie_id: i32,
) -> Result<(LikeToggle, movie::Model), DomainError> {
    let txn = db.begin().await?;

    let target = movie::Entity::find_by_id(movie_id)
        .one(&txn)
        .await?
        .ok_or(DomainError::NotFound)?;

    let existing = like::Entity::find()
        .filter(like::Column::UserId.eq(user_id))
        .filter(like::Column::MovieId.eq(movie_id))
        .one(&txn)
        .await?;

    let state = match existing {
        None => {
            let new_like = like::ActiveModel {
                user_id: Set(user_id),
                movie_id: Set(movie_id),
                created_at: Set(chrono::Utc::now().to_rfc3339()),
            };
            new_like.insert(&txn).await?;

            let favorites =
                list_service::get_or_create_system_list(&txn, user_id, SystemList::Favorites)
                    .await?;
            list_service::ensure_membership(&txn, &favorites.id, movie_id, AUTO_NOTE).await?;

            tracing::info!("user {} liked movie {}", user_id, movie_id);
            LikeToggle::Liked
        }
        Some(found) => {
            found.delete(&txn).await?;

            // Best effort: the list may have been deleted independently.
            if let Some(favorites) =
                list_service::find_system_list(&txn, user_id, SystemList::Favorites).await?
            {
                list_service::remove_membership_if_present(&txn, &favorites.id, movie_id).await?;
            }

            tracing::info!("user {} unliked movie {}", user_id, movie_id);
            LikeToggle::Unliked
        }
    };

    txn.commit().await?;
    Ok((state, target))
}

pub async fn toggle_view(
    db: &DatabaseConnection,
    user_id: i32,
    movie_id: i32,
) -> Result<(ViewToggle, movie::Model), DomainError> {
    let txn = db.begin().await?;

    let target = movie::Entity::find_by_id(movie_id)
        .one(&txn)
        .await?
        .ok_or(DomainError::NotFound)?;

    let existing = view::Entity::find()
        .filter(view::Column::UserId.eq(user_id))
        .filter(view::Column::MovieId.eq(movie_id))
        .one(&txn)
        .await?;

    let state = match existing {
        None => {
            let new_view = view::ActiveModel {
                user_id: Set(user_id),
                movie_id: Set(movie_id),
                viewed_at: Set(chrono::Utc::now().to_rfc3339()),
            };
            new_view.insert(&txn).await?;

            let watched =
                list_service::get_or_create_system_list(&txn, user_id, SystemList::Watched)
                    .await?;
            list_service::ensure_membership(&txn, &watched.id, movie_id, AUTO_NOTE).await?;

            tracing::info!("user {} marked movie {} as viewed", user_id, movie_id);
            ViewToggle::Viewed
        }
        Some(found) => {
            found.delete(&txn).await?;

            if let Some(watched) =
                list_service::find_system_list(&txn, user_id, SystemList::Watched).await?
            {
                list_service::remove_membership_if_present(&txn, &watched.id, movie_id).await?;
            }

            tracing::info!("user {} unmarked movie {} as viewed", user_id, movie_id);
            ViewToggle::Unviewed
        }
    };

    txn.commit().await?;
    Ok((state, target))
}
