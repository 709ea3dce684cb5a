use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use critiq::db;
use critiq::domain::DomainError;
use critiq::models::movie;
use critiq::tmdb::{self, TmdbClient};

async fn mount_genre_list(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [
                { "id": 28, "name": "Action" },
                { "id": 18, "name": "Drama" }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_import_creates_and_refreshes_movies() {
    let server = MockServer::start().await;
    mount_genre_list(&server).await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "title": "Heat",
                    "overview": "A crew of professional thieves and an obsessive detective.",
                    "release_date": "1995-12-15",
                    "genre_ids": [28, 18],
                    "poster_path": "/heat.jpg"
                },
                {
                    "title": "Mystery Film",
                    "overview": "",
                    "release_date": null,
                    "genre_ids": [99],
                    "poster_path": null
                }
            ]
        })))
        .mount(&server)
        .await;

    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");

    let client = TmdbClient::new("test-token")
        .expect("build client")
        .with_base_url(server.uri());

    let imported = tmdb::import_movies(&db, &client, 1)
        .await
        .expect("import should succeed");
    assert_eq!(imported, 2);

    let heat = movie::Entity::find()
        .filter(movie::Column::Title.eq("Heat"))
        .one(&db)
        .await
        .expect("fetch")
        .expect("Heat imported");
    assert_eq!(heat.release_year, 1995);
    assert_eq!(heat.genre, "Action, Drama");
    assert_eq!(heat.poster_url, "https://image.tmdb.org/t/p/w500/heat.jpg");

    // Missing metadata falls back to defaults, unknown genres stay unknown
    let mystery = movie::Entity::find()
        .filter(movie::Column::Title.eq("Mystery Film"))
        .one(&db)
        .await
        .expect("fetch")
        .expect("Mystery Film imported");
    assert_eq!(mystery.release_year, 0);
    assert_eq!(mystery.genre, "Unknown");
    assert_eq!(mystery.description, "No description available");
    assert_eq!(mystery.poster_url, "");

    // A second import refreshes in place instead of duplicating
    let imported_again = tmdb::import_movies(&db, &client, 1)
        .await
        .expect("reimport should succeed");
    assert_eq!(imported_again, 2);

    let total = movie::Entity::find().count(&db).await.expect("count");
    assert_eq!(total, 2);
}

#[tokio::test]
async fn test_import_surfaces_provider_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");

    let client = TmdbClient::new("test-token")
        .expect("build client")
        .with_base_url(server.uri());

    let err = tmdb::import_movies(&db, &client, 1)
        .await
        .expect_err("provider failure must surface");
    assert!(matches!(err, DomainError::External(_)));
}
