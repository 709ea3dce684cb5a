//! Membership engine: lists and their movie membership rows.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::domain::DomainError;
use crate::models::{list, movie, movie_in_list};

/// The two auto-managed lists reserved per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemList {
    Favorites,
    Watched,
}

impl SystemList {
    pub fn name(&self) -> &'static str {
        match self {
            SystemList::Favorites => "Favorites",
            SystemList::Watched => "Watched",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SystemList::Favorites => "Movies you have liked",
            SystemList::Watched => "Movies you have watched",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateListInput {
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
}

pub async fn find_system_list<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    kind: SystemList,
) -> Result<Option<list::Model>, DomainError> {
    let found = list::Entity::find()
        .filter(list::Column::Name.eq(kind.name()))
        .filter(list::Column::CreatedBy.eq(user_id))
        .filter(list::Column::IsSystem.eq(true))
        .one(conn)
        .await?;

    Ok(found)
}

/// Fetch the user's system list of the given kind, creating it if absent.
/// A unique-constraint violation means another request created it between
/// our check and insert; that counts as success and we re-fetch.
pub async fn get_or_create_system_list<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    kind: SystemList,
) -> Result<list::Model, DomainError> {
    if let Some(existing) = find_system_list(conn, user_id, kind).await? {
        return Ok(existing);
    }

    let now = chrono::Utc::now().to_rfc3339();
    let new_list = list::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(kind.name().to_string()),
        description: Set(Some(kind.description().to_string())),
        created_by: Set(user_id),
        is_public: Set(false),
        is_system: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    match new_list.insert(conn).await {
        Ok(created) => Ok(created),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            // Lost the creation race; the row exists now.
            find_system_list(conn, user_id, kind)
                .await?
                .ok_or_else(|| DomainError::Database("system list missing after insert conflict".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn create_list(
    db: &DatabaseConnection,
    user_id: i32,
    input: CreateListInput,
) -> Result<list::Model, DomainError> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::Validation("name is required".to_string()));
    }

    let duplicate = list::Entity::find()
        .filter(list::Column::Name.eq(&name))
        .filter(list::Column::CreatedBy.eq(user_id))
        .one(db)
        .await?;

    if duplicate.is_some() {
        return Err(DomainError::Conflict(
            "A list with this name already exists".to_string(),
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let new_list = list::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(name),
        description: Set(input.description),
        created_by: Set(user_id),
        is_public: Set(input.is_public),
        is_system: Set(false),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };

    match new_list.insert(db).await {
        Ok(created) => Ok(created),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
            DomainError::Conflict("A list with this name already exists".to_string()),
        ),
        Err(err) => Err(err.into()),
    }
}

/// Fetch a list owned by `user_id`, or NotFound.
pub async fn find_owned_list<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    list_id: &str,
) -> Result<list::Model, DomainError> {
    list::Entity::find_by_id(list_id.to_string())
        .filter(list::Column::CreatedBy.eq(user_id))
        .one(conn)
        .await?
        .ok_or(DomainError::NotFound)
}

/// Add a movie to a list. Rejects with Conflict if the movie is already
/// present. Runs the check-then-insert inside a transaction.
pub async fn add_movie(
    db: &DatabaseConnection,
    user_id: i32,
    list_id: &str,
    movie_id: i32,
    note: Option<String>,
) -> Result<movie_in_list::Model, DomainError> {
    let txn = db.begin().await?;

    let target = find_owned_list(&txn, user_id, list_id).await?;

    movie::Entity::find_by_id(movie_id)
        .one(&txn)
        .await?
        .ok_or(DomainError::NotFound)?;

    let existing = movie_in_list::Entity::find()
        .filter(movie_in_list::Column::ListId.eq(&target.id))
        .filter(movie_in_list::Column::MovieId.eq(movie_id))
        .one(&txn)
        .await?;

    if existing.is_some() {
        return Err(DomainError::Conflict(
            "Movie is already in this list".to_string(),
        ));
    }

    let entry = movie_in_list::ActiveModel {
        list_id: Set(target.id.clone()),
        movie_id: Set(movie_id),
        note: Set(note.unwrap_or_default()),
        added_at: Set(chrono::Utc::now().to_rfc3339()),
    };

    let created = match entry.insert(&txn).await {
        Ok(created) => created,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(DomainError::Conflict(
                "Movie is already in this list".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    txn.commit().await?;

    tracing::info!("user {} added movie {} to list {}", user_id, movie_id, target.id);
    Ok(created)
}

/// Remove a movie from a list. Repeated removal keeps reporting NotFound.
pub async fn remove_movie(
    db: &DatabaseConnection,
    user_id: i32,
    list_id: &str,
    movie_id: i32,
) -> Result<(), DomainError> {
    let target = find_owned_list(db, user_id, list_id).await?;

    let result = movie_in_list::Entity::delete_many()
        .filter(movie_in_list::Column::ListId.eq(&target.id))
        .filter(movie_in_list::Column::MovieId.eq(movie_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::NotFound);
    }

    tracing::info!("user {} removed movie {} from list {}", user_id, movie_id, target.id);
    Ok(())
}

/// Get-or-create a membership row. Used by the engagement engine for the
/// system-list mirror, where an existing row is not an error.
pub async fn ensure_membership<C: ConnectionTrait>(
    conn: &C,
    list_id: &str,
    movie_id: i32,
    note: &str,
) -> Result<(), DomainError> {
    let existing = movie_in_list::Entity::find()
        .filter(movie_in_list::Column::ListId.eq(list_id))
        .filter(movie_in_list::Column::MovieId.eq(movie_id))
        .one(conn)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let entry = movie_in_list::ActiveModel {
        list_id: Set(list_id.to_string()),
        movie_id: Set(movie_id),
        note: Set(note.to_string()),
        added_at: Set(chrono::Utc::now().to_rfc3339()),
    };

    match entry.insert(conn).await {
        Ok(_) => Ok(()),
        // Concurrent insert of the same mirror row counts as done.
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Delete a membership row if present. The mirror may have been removed
/// independently; its absence is not an error.
pub async fn remove_membership_if_present<C: ConnectionTrait>(
    conn: &C,
    list_id: &str,
    movie_id: i32,
) -> Result<(), DomainError> {
    movie_in_list::Entity::delete_many()
        .filter(movie_in_list::Column::ListId.eq(list_id))
        .filter(movie_in_list::Column::MovieId.eq(movie_id))
        .exec(conn)
        .await?;

    Ok(())
}
