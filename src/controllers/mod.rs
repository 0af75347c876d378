pub mod areas;
pub mod films;
pub mod sessions;
pub mod transactions;
pub mod users;

use axum::{http::StatusCode, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(users::routes())
        .merge(areas::routes())
        .merge(films::routes())
        .merge(sessions::routes())
        .merge(transactions::routes())
}

/// Success envelope shared by every endpoint.
pub(crate) fn respond<T: Serialize>(
    status: StatusCode,
    message: &str,
    data: T,
) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({
            "success": true,
            "message": message,
            "data": data,
        })),
    )
}

pub(crate) fn validate<T: Validate>(request: &T) -> Result<(), AppError> {
    request
        .validate()
        .map_err(|errors| AppError::bad_request(errors.to_string()))
}
