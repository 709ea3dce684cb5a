//! TMDB catalog provider client and batch import.
//!
//! The client is constructed explicitly and passed to the import job; it is
//! never used on the request path.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::models::movie;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbMovie {
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    genres: Vec<TmdbGenre>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: i64,
    name: String,
}

pub struct TmdbClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(token: impl Into<String>) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| DomainError::External(e.to_string()))?;

        Ok(Self {
            http,
            token: token.into(),
            base_url: TMDB_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn genre_names(&self) -> Result<HashMap<i64, String>, DomainError> {
        let url = format!("{}/genre/movie/list", self.base_url);
        let resp: GenreListResponse = self.get_json(&url).await?;

        Ok(resp.genres.into_iter().map(|g| (g.id, g.name)).collect())
    }

    pub async fn discover_movies(&self, page: u32) -> Result<Vec<TmdbMovie>, DomainError> {
        let url = format!("{}/discover/movie?page={}", self.base_url, page);
        let resp: DiscoverResponse = self.get_json(&url).await?;

        Ok(resp.results)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, DomainError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| DomainError::External(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DomainError::External(format!(
                "TMDB returned {}",
                resp.status()
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|e| DomainError::External(e.to_string()))
    }
}

/// Import `pages` pages of discovered movies (about 20 per page), keyed on
/// title: an existing movie with the same title is refreshed in place.
pub async fn import_movies(
    db: &DatabaseConnection,
    client: &TmdbClient,
    pages: u32,
) -> Result<usize, DomainError> {
    let genres = client.genre_names().await?;
    let mut total_imported = 0;

    for page in 1..=pages {
        let movies = client.discover_movies(page).await?;

        for movie_data in movies {
            let genre = movie_data
                .genre_ids
                .iter()
                .map(|id| genres.get(id).map(String::as_str).unwrap_or("Unknown"))
                .collect::<Vec<_>>()
                .join(", ");

            let description = match movie_data.overview {
                Some(ref o) if !o.is_empty() => o.clone(),
                _ => "No description available".to_string(),
            };

            let release_year = movie_data
                .release_date
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse::<i32>().ok())
                .unwrap_or(0);

            let poster_url = movie_data
                .poster_path
                .as_deref()
                .map(|p| format!("{}{}", POSTER_BASE_URL, p))
                .unwrap_or_default();

            let now = chrono::Utc::now().to_rfc3339();
            let existing = movie::Entity::find()
                .filter(movie::Column::Title.eq(&movie_data.title))
                .one(db)
                .await?;

            match existing {
                Some(found) => {
                    let mut active: movie::ActiveModel = found.into();
                    active.description = Set(description);
                    active.release_year = Set(release_year);
                    active.genre = Set(genre);
                    active.poster_url = Set(poster_url);
                    active.updated_at = Set(now);
                    active.update(db).await?;
                }
                None => {
                    let new_movie = movie::ActiveModel {
                        title: Set(movie_data.title.clone()),
                        description: Set(description),
                        release_year: Set(release_year),
                        genre: Set(genre),
                        poster_url: Set(poster_url),
                        created_by: Set(None),
                        created_at: Set(now.clone()),
                        updated_at: Set(now),
                        ..Default::default()
                    };
                    new_movie.insert(db).await?;
                }
            }

            total_imported += 1;
        }
    }

    tracing::info!("{} movies imported from TMDB", total_imported);
    Ok(total_imported)
}
