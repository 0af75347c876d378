use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::controllers::{respond, validate};
use crate::error::AppError;
use crate::middleware::AdminUser;
use crate::models::{Area, NewArea};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/areas", post(create_area).get(list_areas))
        .route("/areas/{id}", get(get_area).put(update_area).delete(delete_area))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAreaRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 1))]
    pub spot_count: i32,
    #[validate(range(min = 1))]
    pub spot_per_row: i32,
}

impl From<CreateAreaRequest> for NewArea {
    fn from(req: CreateAreaRequest) -> Self {
        NewArea {
            name: req.name.trim().to_string(),
            spot_count: req.spot_count,
            spot_per_row: req.spot_per_row,
        }
    }
}

// POST /api/v1/areas
async fn create_area(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateAreaRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&req)?;

    let area = Area::create(&state.db.pool, NewArea::from(req)).await?;

    info!(area_id = area.id, admin = %admin.username, "area created");
    Ok(respond(StatusCode::CREATED, "area created", area))
}

// GET /api/v1/areas
async fn list_areas(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let areas = Area::list(&state.db.pool).await?;
    Ok(respond(StatusCode::OK, "areas", areas))
}

// GET /api/v1/areas/{id}
async fn get_area(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let area = Area::find_by_id(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("area {id} not found")))?;
    Ok(respond(StatusCode::OK, "area", area))
}

// PUT /api/v1/areas/{id}
async fn update_area(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<CreateAreaRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&req)?;

    let area = Area::update(&state.db.pool, id, NewArea::from(req))
        .await?
        .ok_or_else(|| AppError::not_found(format!("area {id} not found")))?;
    info!(area_id = area.id, admin = %admin.username, "area updated");
    Ok(respond(StatusCode::OK, "area updated", area))
}

// DELETE /api/v1/areas/{id}
async fn delete_area(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !Area::delete(&state.db.pool, id).await? {
        return Err(AppError::not_found(format!("area {id} not found")));
    }
    info!(area_id = id, admin = %admin.username, "area deleted");
    Ok(respond(StatusCode::OK, "area deleted", serde_json::json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_names_are_trimmed_and_dimensions_must_be_positive() {
        let req = CreateAreaRequest {
            name: "  Studio 1 ".into(),
            spot_count: 0,
            spot_per_row: 10,
        };
        assert!(req.validate().is_err());

        let area = NewArea::from(CreateAreaRequest { spot_count: 20, ..req });
        assert_eq!(area.name, "Studio 1");
        assert_eq!((area.spot_count, area.spot_per_row), (20, 10));
    }
}
