use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::controllers::respond;
use crate::error::AppError;
use crate::middleware::AdminUser;
use crate::models::{Area, Film, Session, Spot};
use crate::repository::{ReferenceData, SeatStore};
use crate::services::CreateSessionRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/upcoming", get(list_upcoming))
        .route("/sessions/{id}", get(session_detail).delete(delete_session))
        .route("/sessions/{id}/spots", get(seat_map))
        .route("/films/{slug}/sessions", get(sessions_for_film))
}

#[derive(Debug, Serialize)]
struct SpotResponse {
    id: i64,
    label: String,
    row: String,
    number: i32,
    reserved: bool,
}

impl From<Spot> for SpotResponse {
    fn from(spot: Spot) -> Self {
        SpotResponse {
            id: spot.id,
            label: spot.label(),
            reserved: spot.is_reserved(),
            row: spot.row,
            number: spot.number,
        }
    }
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    session_id: i64,
    total: usize,
    available: usize,
    spots: Vec<SpotResponse>,
}

#[derive(Debug, Serialize)]
struct SessionDetailResponse {
    #[serde(flatten)]
    session: Session,
    film: Film,
    area: Area,
    total_spots: usize,
    available_spots: usize,
}

// POST /api/v1/sessions
async fn create_session(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.scheduler.create_session(req).await?;
    info!(session_id = session.id, admin = %admin.username, "session created");
    Ok(respond(StatusCode::CREATED, "session created", session))
}

// GET /api/v1/sessions
async fn list_sessions(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let sessions = Session::list(&state.db.pool).await?;
    Ok(respond(StatusCode::OK, "sessions", sessions))
}

// GET /api/v1/sessions/upcoming
async fn list_upcoming(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let sessions = Session::list_upcoming(&state.db.pool).await?;
    Ok(respond(StatusCode::OK, "upcoming sessions", sessions))
}

// GET /api/v1/films/{slug}/sessions
async fn sessions_for_film(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let film = Film::find_by_slug(&state.db.pool, &slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("film '{slug}' not found")))?;

    let sessions = if film.status.is_bookable() {
        Session::list_for_film(&state.db.pool, film.id).await?
    } else {
        Vec::new()
    };
    Ok(respond(StatusCode::OK, "film sessions", sessions))
}

// GET /api/v1/sessions/{id}
async fn session_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .store
        .find_session(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("session {id} not found")))?;

    // only a concurrent delete can make these miss
    let film = state
        .store
        .find_film_by_id(session.film_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("film {} not found", session.film_id)))?;
    let area = state
        .store
        .find_area_by_id(session.area_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("area {} not found", session.area_id)))?;

    let spots = state.cache.seat_map(id).await?;
    let available_spots = spots.iter().filter(|spot| !spot.is_reserved()).count();
    Ok(respond(
        StatusCode::OK,
        "session",
        SessionDetailResponse {
            session,
            film,
            area,
            total_spots: spots.len(),
            available_spots,
        },
    ))
}

// GET /api/v1/sessions/{id}/spots
async fn seat_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let spots = state.cache.seat_map(id).await?;
    if spots.is_empty() && state.store.find_session(id).await?.is_none() {
        return Err(AppError::not_found(format!("session {id} not found")));
    }

    let spots: Vec<SpotResponse> = spots.into_iter().map(SpotResponse::from).collect();
    let available = spots.iter().filter(|spot| !spot.reserved).count();
    Ok(respond(
        StatusCode::OK,
        "seat map",
        SeatMapResponse {
            session_id: id,
            total: spots.len(),
            available,
            spots,
        },
    ))
}

// DELETE /api/v1/sessions/{id}
async fn delete_session(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_session(id).await? {
        return Err(AppError::not_found(format!("session {id} not found")));
    }

    state.cache.invalidate_seat_map(id).await;
    info!(session_id = id, admin = %admin.username, "session deleted");
    Ok(respond(StatusCode::OK, "session deleted", serde_json::json!({ "id": id })))
}
