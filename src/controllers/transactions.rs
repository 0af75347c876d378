use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{respond, validate};
use crate::error::AppError;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{Transaction, User};
use crate::repository::SeatStore;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions/me", get(my_transactions))
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/users/{username}", get(user_transactions))
        .route("/transactions/sessions/{session_id}", post(book_seats))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BookSeatsRequest {
    #[validate(length(min = 1, max = 50))]
    pub seat_labels: Vec<String>,
}

// POST /api/v1/transactions/sessions/{session_id}
async fn book_seats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(session_id): Path<i64>,
    Json(req): Json<BookSeatsRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&req)?;

    let result = state
        .reservations
        .book(session_id, user.id, &req.seat_labels)
        .await;

    // a lost race also means the cached map is stale
    if matches!(&result, Ok(_) | Err(crate::error::BookingError::Conflict(_))) {
        state.cache.invalidate_seat_map(session_id).await;
    }

    let detail = result?;
    Ok(respond(StatusCode::CREATED, "seats booked", detail))
}

// GET /api/v1/transactions
async fn list_transactions(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let transactions = Transaction::list(&state.db.pool).await?;
    Ok(respond(StatusCode::OK, "transactions", transactions))
}

// GET /api/v1/transactions/me
async fn my_transactions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let transactions = Transaction::list_for_user(&state.db.pool, user.id).await?;
    Ok(respond(StatusCode::OK, "your transactions", transactions))
}

// GET /api/v1/transactions/{id}
async fn get_transaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let not_found = || AppError::not_found(format!("transaction {id} not found"));
    let detail = state.store.find_transaction(id).await?.ok_or_else(not_found)?;

    // other users' transactions are indistinguishable from missing ones
    if detail.transaction.user_id != user.id && !user.is_admin() {
        return Err(not_found());
    }
    Ok(respond(StatusCode::OK, "transaction", detail))
}

// GET /api/v1/transactions/users/{username}
async fn user_transactions(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::find_by_username(&state.db.pool, &username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user '{username}' not found")))?;
    let transactions = Transaction::list_for_user(&state.db.pool, user.id).await?;
    Ok(respond(StatusCode::OK, "user transactions", transactions))
}
