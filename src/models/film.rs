use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::repository::StoreError;

/// Screening status of a film. Only `NowPlaying` films accept new sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "film_status")]
pub enum FilmStatus {
    NowPlaying,
    ComingSoon,
    NotPlaying,
}

impl FilmStatus {
    pub fn is_bookable(&self) -> bool {
        matches!(self, FilmStatus::NowPlaying)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Film {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub synopsis: String,
    pub duration: i32,
    pub genre: String,
    pub producer: String,
    pub director: String,
    pub writer: String,
    pub production: String,
    #[sqlx(rename = "cast_members")]
    pub cast: String,
    pub trailer: String,
    pub image: String,
    pub status: FilmStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFilm {
    pub title: String,
    pub slug: String,
    pub synopsis: String,
    pub duration: i32,
    pub genre: String,
    pub producer: String,
    pub director: String,
    pub writer: String,
    pub production: String,
    pub cast: String,
    pub trailer: String,
    pub image: String,
    pub status: FilmStatus,
}

const FILM_COLUMNS: &str = "id, title, slug, synopsis, duration, genre, producer, director, \
     writer, production, cast_members, trailer, image, status, created_at";

impl Film {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Film>, sqlx::Error> {
        sqlx::query_as::<_, Film>(&format!("SELECT {FILM_COLUMNS} FROM films WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Film>, sqlx::Error> {
        sqlx::query_as::<_, Film>(&format!("SELECT {FILM_COLUMNS} FROM films WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, status: Option<FilmStatus>) -> Result<Vec<Film>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Film>(&format!(
                    "SELECT {FILM_COLUMNS} FROM films WHERE status = $1 ORDER BY title"
                ))
                .bind(status)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Film>(&format!("SELECT {FILM_COLUMNS} FROM films ORDER BY title"))
                    .fetch_all(pool)
                    .await
            }
        }
    }

    pub async fn create(pool: &PgPool, film: NewFilm) -> Result<Film, StoreError> {
        sqlx::query_as::<_, Film>(&format!(
            r#"
            INSERT INTO films (title, slug, synopsis, duration, genre, producer, director,
                               writer, production, cast_members, trailer, image, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {FILM_COLUMNS}
            "#
        ))
        .bind(&film.title)
        .bind(&film.slug)
        .bind(&film.synopsis)
        .bind(film.duration)
        .bind(&film.genre)
        .bind(&film.producer)
        .bind(&film.director)
        .bind(&film.writer)
        .bind(&film.production)
        .bind(&film.cast)
        .bind(&film.trailer)
        .bind(&film.image)
        .bind(film.status)
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::from_write(e, format!("film '{}'", film.slug)))
    }

    pub async fn update_status(
        pool: &PgPool,
        slug: &str,
        status: FilmStatus,
    ) -> Result<Option<Film>, sqlx::Error> {
        sqlx::query_as::<_, Film>(&format!(
            "UPDATE films SET status = $2 WHERE slug = $1 RETURNING {FILM_COLUMNS}"
        ))
        .bind(slug)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Replaces every editable field of the film found by `slug`, the slug included.
    pub async fn update(pool: &PgPool, slug: &str, film: NewFilm) -> Result<Option<Film>, StoreError> {
        sqlx::query_as::<_, Film>(&format!(
            r#"
            UPDATE films
            SET title = $2, slug = $3, synopsis = $4, duration = $5, genre = $6, producer = $7,
                director = $8, writer = $9, production = $10, cast_members = $11,
                trailer = $12, image = $13, status = $14
            WHERE slug = $1
            RETURNING {FILM_COLUMNS}
            "#
        ))
        .bind(slug)
        .bind(&film.title)
        .bind(&film.slug)
        .bind(&film.synopsis)
        .bind(film.duration)
        .bind(&film.genre)
        .bind(&film.producer)
        .bind(&film.director)
        .bind(&film.writer)
        .bind(&film.production)
        .bind(&film.cast)
        .bind(&film.trailer)
        .bind(&film.image)
        .bind(film.status)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::from_write(e, format!("film '{}'", film.slug)))
    }

    /// A film that still has sessions is `InUse`.
    pub async fn delete(pool: &PgPool, slug: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM films WHERE slug = $1")
            .bind(slug)
            .execute(pool)
            .await
            .map_err(|e| StoreError::from_delete(e, format!("film '{slug}'")))?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_its_variant_name_on_the_wire() {
        assert_eq!(serde_json::to_string(&FilmStatus::ComingSoon).unwrap(), "\"ComingSoon\"");
        assert_eq!(
            serde_json::from_str::<FilmStatus>("\"NotPlaying\"").unwrap(),
            FilmStatus::NotPlaying
        );
    }

    #[test]
    fn only_now_playing_is_bookable() {
        assert!(FilmStatus::NowPlaying.is_bookable());
        assert!(!FilmStatus::ComingSoon.is_bookable());
        assert!(!FilmStatus::NotPlaying.is_bookable());
    }

    #[test]
    fn display_names_are_rejected_as_status() {
        assert!(serde_json::from_str::<FilmStatus>("\"Now Playing\"").is_err());
        assert!(serde_json::from_str::<FilmStatus>("\"nowplaying\"").is_err());
    }
}
