use critiq::db;
use critiq::domain::DomainError;
use critiq::models::{movie, report, review, user};
use critiq::services::review_service::{self, ReportOutcome, REPORT_AUTO_DELETE_THRESHOLD};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

// Helper to create a test user
async fn create_test_user(db: &DatabaseConnection, username: &str, role: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let account = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set("hash".to_string()),
        role: Set(role.to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = account.insert(db).await.expect("Failed to create user");
    res.id
}

// Helper to create a test movie
async fn create_test_movie(db: &DatabaseConnection, title: &str, created_by: Option<i32>) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let new_movie = movie::ActiveModel {
        title: Set(title.to_string()),
        description: Set("Description".to_string()),
        release_year: Set(2010),
        genre: Set("Action".to_string()),
        poster_url: Set(String::new()),
        created_by: Set(created_by),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = new_movie.insert(db).await.expect("Failed to create movie");
    res.id
}

#[tokio::test]
async fn test_review_lifecycle_with_admin_delete() {
    let db = setup_test_db().await;
    let author_id = create_test_user(&db, "alice", "user").await;
    let admin_id = create_test_user(&db, "admin", "admin").await;
    let movie_id = create_test_movie(&db, "Inception", Some(author_id)).await;

    let created = review_service::add_review(&db, author_id, movie_id, 5, "Great".to_string())
        .await
        .expect("first review should succeed");
    assert_eq!(created.rating, 5);
    assert_eq!(created.report_count, 0);
    assert!(!created.is_reported);

    let err = review_service::add_review(&db, author_id, movie_id, 4, "Again".to_string())
        .await
        .expect_err("second review by the same user must be rejected");
    assert!(matches!(err, DomainError::Conflict(_)));

    // Admin deletes by explicit id
    review_service::delete_review(&db, admin_id, true, movie_id, Some(created.id))
        .await
        .expect("admin delete should succeed");

    let remaining = review::Entity::find()
        .filter(review::Column::MovieId.eq(movie_id))
        .count(&db)
        .await
        .expect("count");
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_rating_must_be_in_range() {
    let db = setup_test_db().await;
    let author_id = create_test_user(&db, "alice", "user").await;
    let movie_id = create_test_movie(&db, "Inception", None).await;

    for rating in [0, 6, -1] {
        let err = review_service::add_review(&db, author_id, movie_id, rating, String::new())
            .await
            .expect_err("out-of-range rating must be rejected");
        assert!(matches!(err, DomainError::Validation(_)));
    }
}

#[tokio::test]
async fn test_update_review() {
    let db = setup_test_db().await;
    let author_id = create_test_user(&db, "alice", "user").await;
    let movie_id = create_test_movie(&db, "Inception", None).await;

    let err = review_service::update_review(&db, author_id, movie_id, 3, "Meh".to_string())
        .await
        .expect_err("no review yet");
    assert!(matches!(err, DomainError::NotFound));

    review_service::add_review(&db, author_id, movie_id, 5, "Great".to_string())
        .await
        .expect("add review");

    let updated = review_service::update_review(&db, author_id, movie_id, 3, "Meh".to_string())
        .await
        .expect("update should succeed");
    assert_eq!(updated.rating, 3);
    assert_eq!(updated.comment, "Meh");
}

#[tokio::test]
async fn test_delete_review_permissions() {
    let db = setup_test_db().await;
    let author_id = create_test_user(&db, "alice", "user").await;
    let other_id = create_test_user(&db, "bob", "user").await;
    let movie_id = create_test_movie(&db, "Inception", None).await;

    let created = review_service::add_review(&db, author_id, movie_id, 4, "Nice".to_string())
        .await
        .expect("add review");

    // Another regular user cannot delete it, even with the right id
    let err = review_service::delete_review(&db, other_id, false, movie_id, Some(created.id))
        .await
        .expect_err("foreign review");
    assert!(matches!(err, DomainError::NotFound));

    // A user with no review of their own has nothing to delete
    let err = review_service::delete_review(&db, other_id, false, movie_id, None)
        .await
        .expect_err("no own review");
    assert!(matches!(err, DomainError::NotFound));

    // The author deletes their own without an explicit id
    review_service::delete_review(&db, author_id, false, movie_id, None)
        .await
        .expect("own delete should succeed");
}

#[tokio::test]
async fn test_report_threshold_auto_deletes_review() {
    let db = setup_test_db().await;
    let author_id = create_test_user(&db, "author", "user").await;
    let movie_id = create_test_movie(&db, "Inception", None).await;

    let created = review_service::add_review(&db, author_id, movie_id, 4, "Spam".to_string())
        .await
        .expect("add review");

    // Nine distinct reports leave the review up
    for i in 0..(REPORT_AUTO_DELETE_THRESHOLD - 1) {
        let reporter_id = create_test_user(&db, &format!("reporter{}", i), "user").await;
        let outcome = review_service::report_review(
            &db,
            reporter_id,
            movie_id,
            created.id,
            "spam".to_string(),
            None,
        )
        .await
        .expect("report should be accepted");
        assert!(matches!(outcome, ReportOutcome::Accepted(_)));
    }

    let reported = review::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .expect("fetch")
        .expect("review still exists");
    assert!(reported.is_reported);
    assert_eq!(reported.report_count, REPORT_AUTO_DELETE_THRESHOLD - 1);

    // The tenth report crosses the threshold and deletes the review
    let tenth_id = create_test_user(&db, "reporter9", "user").await;
    let outcome = review_service::report_review(
        &db,
        tenth_id,
        movie_id,
        created.id,
        "spam".to_string(),
        None,
    )
    .await
    .expect("tenth report should succeed");
    assert!(matches!(outcome, ReportOutcome::AutoDeleted));

    let gone = review::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .expect("fetch");
    assert!(gone.is_none());

    // Reports cascade with the review
    let orphaned = report::Entity::find()
        .filter(report::Column::ReviewId.eq(created.id))
        .count(&db)
        .await
        .expect("count reports");
    assert_eq!(orphaned, 0);

    // An eleventh report attempt hits a missing review
    let eleventh_id = create_test_user(&db, "reporter10", "user").await;
    let err = review_service::report_review(
        &db,
        eleventh_id,
        movie_id,
        created.id,
        "spam".to_string(),
        None,
    )
    .await
    .expect_err("review is gone");
    assert!(matches!(err, DomainError::NotFound));
}

#[tokio::test]
async fn test_duplicate_report_is_a_conflict() {
    let db = setup_test_db().await;
    let author_id = create_test_user(&db, "author", "user").await;
    let reporter_id = create_test_user(&db, "reporter", "user").await;
    let movie_id = create_test_movie(&db, "Inception", None).await;

    let created = review_service::add_review(&db, author_id, movie_id, 4, "Spam".to_string())
        .await
        .expect("add review");

    review_service::report_review(
        &db,
        reporter_id,
        movie_id,
        created.id,
        "spam".to_string(),
        Some("obvious spam".to_string()),
    )
    .await
    .expect("first report accepted");

    let err = review_service::report_review(
        &db,
        reporter_id,
        movie_id,
        created.id,
        "abuse".to_string(),
        None,
    )
    .await
    .expect_err("second report by the same user must be rejected");
    assert!(matches!(err, DomainError::Conflict(_)));

    // The counter did not move
    let reported = review::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .expect("fetch")
        .expect("review exists");
    assert_eq!(reported.report_count, 1);
}

#[tokio::test]
async fn test_report_unknown_review_not_found() {
    let db = setup_test_db().await;
    let reporter_id = create_test_user(&db, "reporter", "user").await;
    let movie_id = create_test_movie(&db, "Inception", None).await;
    let other_movie_id = create_test_movie(&db, "Tenet", None).await;

    let err = review_service::report_review(
        &db,
        reporter_id,
        movie_id,
        9999,
        "spam".to_string(),
        None,
    )
    .await
    .expect_err("unknown review");
    assert!(matches!(err, DomainError::NotFound));

    // A review id paired with the wrong movie is also a miss
    let author_id = create_test_user(&db, "author", "user").await;
    let created = review_service::add_review(&db, author_id, movie_id, 4, "Ok".to_string())
        .await
        .expect("add review");

    let err = review_service::report_review(
        &db,
        reporter_id,
        other_movie_id,
        created.id,
        "spam".to_string(),
        None,
    )
    .await
    .expect_err("review belongs to another movie");
    assert!(matches!(err, DomainError::NotFound));
}

#[tokio::test]
async fn test_reported_review_listings() {
    let db = setup_test_db().await;
    let author_id = create_test_user(&db, "author", "user").await;
    let reporter_id = create_test_user(&db, "reporter", "user").await;
    let movie_id = create_test_movie(&db, "Inception", None).await;

    let created = review_service::add_review(&db, author_id, movie_id, 4, "Hmm".to_string())
        .await
        .expect("add review");

    review_service::report_review(
        &db,
        reporter_id,
        movie_id,
        created.id,
        "spam".to_string(),
        None,
    )
    .await
    .expect("report");

    let reports = review_service::list_reports(&db, movie_id, created.id)
        .await
        .expect("list reports");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0.reason, "spam");

    let reported = review_service::list_reported_reviews(&db, movie_id)
        .await
        .expect("list reported reviews");
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].0.id, created.id);

    let all_reported = review_service::list_all_reported_reviews(&db)
        .await
        .expect("list all reported reviews");
    assert_eq!(all_reported.len(), 1);
}
