use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};

use crate::auth::hash_password;
use crate::models::{movie, user};

async fn ensure_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<(), DbErr> {
    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let now = chrono::Utc::now().to_rfc3339();
    let password_hash =
        hash_password(password).map_err(|e| DbErr::Custom(format!("hash failure: {}", e)))?;

    let account = user::ActiveModel {
        username: Set(username.to_owned()),
        email: Set(email.to_owned()),
        password_hash: Set(password_hash),
        role: Set(role.to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };
    account.insert(db).await?;

    Ok(())
}

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Users
    ensure_user(db, "admin", "admin@critiq.ovh", "admin", "admin").await?;
    ensure_user(db, "user", "user@critiq.ovh", "user", "user").await?;

    // 2. Movies (only on an empty catalog)
    let movie_count = movie::Entity::find().count(db).await?;
    if movie_count > 0 {
        return Ok(());
    }

    let demo_movies = vec![
        (
            "Inception",
            "A thief who steals corporate secrets through dream-sharing technology.",
            2010,
            "Science Fiction, Action",
        ),
        (
            "The Godfather",
            "The aging patriarch of an organized crime dynasty transfers control to his son.",
            1972,
            "Crime, Drama",
        ),
        (
            "Spirited Away",
            "A young girl wanders into a world ruled by gods, witches and spirits.",
            2001,
            "Animation, Fantasy",
        ),
        (
            "Parasite",
            "Greed and class discrimination threaten the symbiotic relationship between two families.",
            2019,
            "Thriller, Drama",
        ),
    ];

    let now = chrono::Utc::now().to_rfc3339();
    for (title, description, release_year, genre) in demo_movies {
        let demo = movie::ActiveModel {
            title: Set(title.to_owned()),
            description: Set(description.to_owned()),
            release_year: Set(release_year),
            genre: Set(genre.to_owned()),
            poster_url: Set(String::new()),
            created_by: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        demo.insert(db).await?;
    }

    Ok(())
}
