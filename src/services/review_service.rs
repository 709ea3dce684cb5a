//! Review and moderation engine.
//!
//! Review lifecycle: Active -> Reported(count) -> Deleted. A review that
//! collects `REPORT_AUTO_DELETE_THRESHOLD` distinct reports is deleted in
//! the same transaction as the report that crossed the line.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};

use crate::domain::DomainError;
use crate::models::{movie, report, review, user};

/// Distinct reports that trigger automatic deletion. A fixed absolute count
/// cannot be gamed by a small burst of coordinated accounts.
pub const REPORT_AUTO_DELETE_THRESHOLD: i32 = 10;

#[derive(Debug)]
pub enum ReportOutcome {
    /// Report recorded; the review stays up.
    Accepted(report::Model),
    /// The report crossed the threshold and the review was deleted.
    AutoDeleted,
}

fn validate_rating(rating: i32) -> Result<(), DomainError> {
    if !(1..=5).contains(&rating) {
        return Err(DomainError::Validation(
            "rating must be an integer between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_reviews(
    db: &DatabaseConnection,
    movie_id: i32,
) -> Result<Vec<(review::Model, Option<user::Model>)>, DomainError> {
    movie::Entity::find_by_id(movie_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;

    let reviews = review::Entity::find()
        .filter(review::Column::MovieId.eq(movie_id))
        .order_by_desc(review::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    Ok(reviews)
}

/// One review per (user, movie): the duplicate check runs inside the
/// transaction, before the insert.
pub async fn add_review(
    db: &DatabaseConnection,
    user_id: i32,
    movie_id: i32,
    rating: i32,
    comment: String,
) -> Result<review::Model, DomainError> {
    validate_rating(rating)?;

    let txn = db.begin().await?;

    movie::Entity::find_by_id(movie_id)
        .one(&txn)
        .await?
        .ok_or(DomainError::NotFound)?;

    let existing = review::Entity::find()
        .filter(review::Column::UserId.eq(user_id))
        .filter(review::Column::MovieId.eq(movie_id))
        .one(&txn)
        .await?;

    if existing.is_some() {
        return Err(DomainError::Conflict(
            "You have already reviewed this movie".to_string(),
        ));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let new_review = review::ActiveModel {
        user_id: Set(user_id),
        movie_id: Set(movie_id),
        rating: Set(rating),
        comment: Set(comment),
        is_reported: Set(false),
        report_count: Set(0),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = new_review.insert(&txn).await?;
    txn.commit().await?;

    tracing::info!("user {} reviewed movie {}", user_id, movie_id);
    Ok(created)
}

pub async fn update_review(
    db: &DatabaseConnection,
    user_id: i32,
    movie_id: i32,
    rating: i32,
    comment: String,
) -> Result<review::Model, DomainError> {
    validate_rating(rating)?;

    let existing = review::Entity::find()
        .filter(review::Column::UserId.eq(user_id))
        .filter(review::Column::MovieId.eq(movie_id))
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;

    let mut active: review::ActiveModel = existing.into();
    active.rating = Set(rating);
    active.comment = Set(comment);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    let updated = active.update(db).await?;
    Ok(updated)
}

/// A regular user deletes their own review; an admin may delete any review
/// on the movie by passing its id explicitly.
pub async fn delete_review(
    db: &DatabaseConnection,
    user_id: i32,
    is_admin: bool,
    movie_id: i32,
    review_id: Option<i32>,
) -> Result<(), DomainError> {
    let target = match review_id {
        Some(rid) => {
            let found = review::Entity::find_by_id(rid)
                .filter(review::Column::MovieId.eq(movie_id))
                .one(db)
                .await?
                .ok_or(DomainError::NotFound)?;

            if found.user_id != user_id && !is_admin {
                return Err(DomainError::NotFound);
            }
            found
        }
        None => review::Entity::find()
            .filter(review::Column::UserId.eq(user_id))
            .filter(review::Column::MovieId.eq(movie_id))
            .one(db)
            .await?
            .ok_or(DomainError::NotFound)?,
    };

    let deleted_id = target.id;
    target.delete(db).await?;

    tracing::info!("review {} on movie {} deleted by user {}", deleted_id, movie_id, user_id);
    Ok(())
}

/// File a report against a review. A user may report a given review once;
/// the report that reaches the threshold deletes the review in the same
/// transaction and signals the auto-deletion to the caller.
pub async fn report_review(
    db: &DatabaseConnection,
    user_id: i32,
    movie_id: i32,
    review_id: i32,
    reason: String,
    description: Option<String>,
) -> Result<ReportOutcome, DomainError> {
    let txn = db.begin().await?;

    let target = review::Entity::find_by_id(review_id)
        .filter(review::Column::MovieId.eq(movie_id))
        .one(&txn)
        .await?
        .ok_or(DomainError::NotFound)?;

    let duplicate = report::Entity::find()
        .filter(report::Column::UserId.eq(user_id))
        .filter(report::Column::ReviewId.eq(review_id))
        .one(&txn)
        .await?;

    if duplicate.is_some() {
        return Err(DomainError::Conflict(
            "You have already reported this review".to_string(),
        ));
    }

    let new_report = report::ActiveModel {
        user_id: Set(user_id),
        review_id: Set(review_id),
        reason: Set(reason),
        description: Set(description),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
    };

    let created = match new_report.insert(&txn).await {
        Ok(created) => created,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(DomainError::Conflict(
                "You have already reported this review".to_string(),
            ));
        }
        Err(err) => return Err(err.into()),
    };

    let report_count = target.report_count + 1;

    if report_count >= REPORT_AUTO_DELETE_THRESHOLD {
        // Reports cascade with the review.
        target.delete(&txn).await?;
        txn.commit().await?;

        tracing::info!(
            "review {} on movie {} auto-deleted after {} reports",
            review_id,
            movie_id,
            report_count
        );
        return Ok(ReportOutcome::AutoDeleted);
    }

    let mut active: review::ActiveModel = target.into();
    active.is_reported = Set(true);
    active.report_count = Set(report_count);
    active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!("user {} reported review {} on movie {}", user_id, review_id, movie_id);
    Ok(ReportOutcome::Accepted(created))
}

/// Reports filed against one review. Admin only (enforced by the caller).
pub async fn list_reports(
    db: &DatabaseConnection,
    movie_id: i32,
    review_id: i32,
) -> Result<Vec<(report::Model, Option<user::Model>)>, DomainError> {
    review::Entity::find_by_id(review_id)
        .filter(review::Column::MovieId.eq(movie_id))
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;

    let reports = report::Entity::find()
        .filter(report::Column::ReviewId.eq(review_id))
        .order_by_desc(report::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    Ok(reports)
}

pub async fn list_reported_reviews(
    db: &DatabaseConnection,
    movie_id: i32,
) -> Result<Vec<(review::Model, Option<user::Model>)>, DomainError> {
    movie::Entity::find_by_id(movie_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound)?;

    let reviews = review::Entity::find()
        .filter(review::Column::MovieId.eq(movie_id))
        .filter(review::Column::IsReported.eq(true))
        .order_by_desc(review::Column::ReportCount)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    Ok(reviews)
}

pub async fn list_all_reported_reviews(
    db: &DatabaseConnection,
) -> Result<Vec<(review::Model, Option<user::Model>)>, DomainError> {
    let reviews = review::Entity::find()
        .filter(review::Column::IsReported.eq(true))
        .order_by_desc(review::Column::ReportCount)
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    Ok(reviews)
}
