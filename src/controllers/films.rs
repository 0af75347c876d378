use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::controllers::{respond, validate};
use crate::error::AppError;
use crate::middleware::AdminUser;
use crate::models::{Film, FilmStatus, NewFilm};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/films", post(create_film).get(list_films))
        .route("/films/{slug}", get(get_film).put(update_film).delete(delete_film))
        .route("/films/{slug}/status", put(update_status))
}

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let well_formed = !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message(Cow::from("slug may only contain a-z, 0-9 and inner dashes")))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFilmRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1))]
    pub synopsis: String,
    /// Running time in minutes.
    #[validate(range(min = 1, max = 1000))]
    pub duration: i32,
    #[validate(length(min = 1))]
    pub genre: String,
    #[serde(default)]
    pub producer: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub writer: String,
    #[serde(default)]
    pub production: String,
    #[serde(default)]
    pub cast: String,
    #[serde(default)]
    pub trailer: String,
    #[serde(default)]
    pub image: String,
    pub status: FilmStatus,
}

impl From<CreateFilmRequest> for NewFilm {
    fn from(req: CreateFilmRequest) -> Self {
        NewFilm {
            title: req.title,
            slug: req.slug,
            synopsis: req.synopsis,
            duration: req.duration,
            genre: req.genre,
            producer: req.producer,
            director: req.director,
            writer: req.writer,
            production: req.production,
            cast: req.cast,
            trailer: req.trailer,
            image: req.image,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: FilmStatus,
}

#[derive(Debug, Deserialize)]
pub struct FilmQuery {
    pub status: Option<FilmStatus>,
}

// POST /api/v1/films
async fn create_film(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateFilmRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&req)?;

    let film = Film::create(&state.db.pool, NewFilm::from(req)).await?;

    if film.status == FilmStatus::NowPlaying {
        state.cache.invalidate_films().await;
    }

    info!(film_id = film.id, slug = %film.slug, admin = %admin.username, "film created");
    Ok(respond(StatusCode::CREATED, "film created", film))
}

// GET /api/v1/films?status=ComingSoon
// Without a status filter only films now playing are listed.
async fn list_films(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FilmQuery>,
) -> Result<impl IntoResponse, AppError> {
    let films = match query.status {
        None | Some(FilmStatus::NowPlaying) => state.cache.now_playing_films().await?,
        Some(other) => Film::list(&state.db.pool, Some(other)).await?,
    };
    Ok(respond(StatusCode::OK, "films", films))
}

// GET /api/v1/films/{slug}
async fn get_film(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let film = Film::find_by_slug(&state.db.pool, &slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("film '{slug}' not found")))?;
    Ok(respond(StatusCode::OK, "film", film))
}

// PUT /api/v1/films/{slug}/status
async fn update_status(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(slug): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let film = Film::update_status(&state.db.pool, &slug, req.status)
        .await?
        .ok_or_else(|| AppError::not_found(format!("film '{slug}' not found")))?;

    state.cache.invalidate_films().await;
    info!(slug = %film.slug, status = ?film.status, admin = %admin.username, "film status changed");
    Ok(respond(StatusCode::OK, "film status updated", film))
}

// PUT /api/v1/films/{slug}
async fn update_film(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(slug): Path<String>,
    Json(req): Json<CreateFilmRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&req)?;

    let film = Film::update(&state.db.pool, &slug, NewFilm::from(req))
        .await?
        .ok_or_else(|| AppError::not_found(format!("film '{slug}' not found")))?;

    state.cache.invalidate_films().await;
    info!(film_id = film.id, slug = %film.slug, admin = %admin.username, "film updated");
    Ok(respond(StatusCode::OK, "film updated", film))
}

// DELETE /api/v1/films/{slug}
async fn delete_film(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !Film::delete(&state.db.pool, &slug).await? {
        return Err(AppError::not_found(format!("film '{slug}' not found")));
    }

    state.cache.invalidate_films().await;
    info!(slug = %slug, admin = %admin.username, "film deleted");
    Ok(respond(StatusCode::OK, "film deleted", serde_json::json!({ "slug": slug })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_words_joined_by_dashes() {
        assert!(validate_slug("the-matrix-1999").is_ok());
        assert!(validate_slug("Matrix").is_err());
        assert!(validate_slug("-matrix").is_err());
        assert!(validate_slug("the matrix").is_err());
    }

    #[test]
    fn status_filter_accepts_only_known_statuses() {
        let query: FilmQuery = serde_json::from_str(r#"{"status":"ComingSoon"}"#).unwrap();
        assert_eq!(query.status, Some(FilmStatus::ComingSoon));
        assert!(serde_json::from_str::<FilmQuery>(r#"{"status":"Soon"}"#).is_err());
        assert_eq!(serde_json::from_str::<FilmQuery>("{}").unwrap().status, None);
    }
}
