use critiq::db;
use critiq::domain::DomainError;
use critiq::models::{like, list, movie, movie_in_list, user, view};
use critiq::services::engagement_service::{self, LikeToggle, ViewToggle};
use critiq::services::list_service::{self, SystemList};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set,
};

// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

// Helper to create a test user
async fn create_test_user(db: &DatabaseConnection, username: &str) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let account = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set("hash".to_string()),
        role: Set("user".to_string()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = account.insert(db).await.expect("Failed to create user");
    res.id
}

// Helper to create a test movie
async fn create_test_movie(db: &DatabaseConnection, title: &str, release_year: i32) -> i32 {
    let now = chrono::Utc::now().to_rfc3339();
    let new_movie = movie::ActiveModel {
        title: Set(title.to_string()),
        description: Set("Description".to_string()),
        release_year: Set(release_year),
        genre: Set("Drama".to_string()),
        poster_url: Set(String::new()),
        created_by: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    let res = new_movie.insert(db).await.expect("Failed to create movie");
    res.id
}

async fn favorites_contains(db: &DatabaseConnection, user_id: i32, movie_id: i32) -> bool {
    let Some(favorites) = list_service::find_system_list(db, user_id, SystemList::Favorites)
        .await
        .expect("lookup favorites")
    else {
        return false;
    };

    movie_in_list::Entity::find()
        .filter(movie_in_list::Column::ListId.eq(&favorites.id))
        .filter(movie_in_list::Column::MovieId.eq(movie_id))
        .one(db)
        .await
        .expect("lookup membership")
        .is_some()
}

#[tokio::test]
async fn test_toggle_like_mirrors_favorites() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "bob").await;
    let movie_id = create_test_movie(&db, "Inception", 2010).await;

    let (state, target) = engagement_service::toggle_like(&db, user_id, movie_id)
        .await
        .expect("first toggle");
    assert_eq!(state, LikeToggle::Liked);
    assert_eq!(target.id, movie_id);
    assert!(favorites_contains(&db, user_id, movie_id).await);

    let entry = movie_in_list::Entity::find()
        .filter(movie_in_list::Column::MovieId.eq(movie_id))
        .one(&db)
        .await
        .expect("fetch mirror")
        .expect("mirror row exists");
    assert_eq!(entry.note, "Added automatically");

    let (state, _) = engagement_service::toggle_like(&db, user_id, movie_id)
        .await
        .expect("second toggle");
    assert_eq!(state, LikeToggle::Unliked);
    assert!(!favorites_contains(&db, user_id, movie_id).await);

    // The engagement row is gone too
    let remaining = like::Entity::find()
        .filter(like::Column::UserId.eq(user_id))
        .count(&db)
        .await
        .expect("count likes");
    assert_eq!(remaining, 0);

    // The system list itself survives the untoggle
    assert!(
        list_service::find_system_list(&db, user_id, SystemList::Favorites)
            .await
            .expect("lookup favorites")
            .is_some()
    );
}

#[tokio::test]
async fn test_double_toggle_returns_to_original_state() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "bob").await;
    let movie_id = create_test_movie(&db, "Inception", 2010).await;

    for _ in 0..2 {
        engagement_service::toggle_like(&db, user_id, movie_id)
            .await
            .expect("toggle");
    }

    let likes = like::Entity::find().count(&db).await.expect("count");
    assert_eq!(likes, 0);
    assert!(!favorites_contains(&db, user_id, movie_id).await);

    // A third toggle flips back on
    let (state, _) = engagement_service::toggle_like(&db, user_id, movie_id)
        .await
        .expect("third toggle");
    assert_eq!(state, LikeToggle::Liked);
    assert!(favorites_contains(&db, user_id, movie_id).await);
}

#[tokio::test]
async fn test_toggle_view_mirrors_watched() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "bob").await;
    let movie_id = create_test_movie(&db, "Inception", 2010).await;

    let (state, _) = engagement_service::toggle_view(&db, user_id, movie_id)
        .await
        .expect("first toggle");
    assert_eq!(state, ViewToggle::Viewed);

    let watched = list_service::find_system_list(&db, user_id, SystemList::Watched)
        .await
        .expect("lookup watched")
        .expect("watched list exists");
    assert_eq!(watched.name, "Watched");
    assert!(watched.is_system);

    let entry = movie_in_list::Entity::find()
        .filter(movie_in_list::Column::ListId.eq(&watched.id))
        .filter(movie_in_list::Column::MovieId.eq(movie_id))
        .one(&db)
        .await
        .expect("fetch mirror");
    assert!(entry.is_some());

    let (state, _) = engagement_service::toggle_view(&db, user_id, movie_id)
        .await
        .expect("second toggle");
    assert_eq!(state, ViewToggle::Unviewed);

    let views = view::Entity::find().count(&db).await.expect("count");
    assert_eq!(views, 0);
}

#[tokio::test]
async fn test_untoggle_tolerates_missing_mirror() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "bob").await;
    let movie_id = create_test_movie(&db, "Inception", 2010).await;

    engagement_service::toggle_like(&db, user_id, movie_id)
        .await
        .expect("toggle on");

    // The favorites list is deleted independently; the membership rows
    // cascade with it.
    let favorites = list_service::find_system_list(&db, user_id, SystemList::Favorites)
        .await
        .expect("lookup favorites")
        .expect("favorites exists");
    favorites.delete(&db).await.expect("delete list");

    // The untoggle must still succeed
    let (state, _) = engagement_service::toggle_like(&db, user_id, movie_id)
        .await
        .expect("toggle off despite missing mirror");
    assert_eq!(state, LikeToggle::Unliked);

    let likes = like::Entity::find().count(&db).await.expect("count");
    assert_eq!(likes, 0);
}

#[tokio::test]
async fn test_toggle_like_unknown_movie_not_found() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "bob").await;

    let err = engagement_service::toggle_like(&db, user_id, 9999)
        .await
        .expect_err("unknown movie");
    assert!(matches!(err, DomainError::NotFound));
}

#[tokio::test]
async fn test_like_and_view_use_separate_system_lists() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db, "bob").await;
    let movie_id = create_test_movie(&db, "Inception", 2010).await;

    engagement_service::toggle_like(&db, user_id, movie_id)
        .await
        .expect("like");
    engagement_service::toggle_view(&db, user_id, movie_id)
        .await
        .expect("view");

    let lists = list::Entity::find()
        .filter(list::Column::CreatedBy.eq(user_id))
        .filter(list::Column::IsSystem.eq(true))
        .all(&db)
        .await
        .expect("fetch lists");
    assert_eq!(lists.len(), 2);

    let mut names: Vec<_> = lists.iter().map(|l| l.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Favorites", "Watched"]);
}
