use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::controllers::{respond, validate};
use crate::error::AppError;
use crate::middleware::{AdminUser, AuthUser};
use crate::models::{NewUser, Role, User};
use crate::repository::{ReferenceData, StoreError};
use crate::services::auth::{hash_password, verify_password};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users", get(list_users))
        .route("/users/me", get(me).delete(delete_me))
        .route("/users/me/name", put(update_my_name))
        .route("/users/{username}", get(get_user))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username", alias = "email")]
    #[validate(length(min = 1))]
    pub identifier: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNameRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    token_type: &'static str,
    expires_in: i64,
    user: UserResponse,
}

// POST /api/v1/users/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&req)?;

    let password_hash = hash_password(req.password).await?;
    let user = User::create(
        &state.db.pool,
        NewUser {
            name: req.name,
            username: req.username,
            email: req.email.to_lowercase(),
            phone: req.phone,
            password_hash,
            role: Role::User,
        },
    )
    .await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(respond(
        StatusCode::CREATED,
        "user registered",
        UserResponse::from(user),
    ))
}

// POST /api/v1/users/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&req)?;

    let identifier = req.identifier.trim();
    let identifier = if identifier.contains('@') {
        identifier.to_lowercase()
    } else {
        identifier.to_string()
    };

    let invalid = || AppError::unauthorized("invalid username or password");
    let user = User::find_by_identifier(&state.db.pool, &identifier)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(req.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let token = state.tokens.issue(&user)?;
    info!(user_id = user.id, "user logged in");
    Ok(respond(
        StatusCode::OK,
        "login successful",
        LoginResponse {
            token,
            token_type: "Bearer",
            expires_in: state.tokens.expires_in_seconds(),
            user: UserResponse::from(user),
        },
    ))
}

// GET /api/v1/users/me
async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_user_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    Ok(respond(StatusCode::OK, "current user", UserResponse::from(user)))
}

// PUT /api/v1/users/me/name
async fn update_my_name(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate(&req)?;

    let updated = User::update_name(&state.db.pool, user.id, req.name.trim())
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))?;
    info!(user_id = updated.id, "user renamed");
    Ok(respond(StatusCode::OK, "name updated", UserResponse::from(updated)))
}

// DELETE /api/v1/users/me
// Accounts that already booked seats stay, their transactions reference them.
async fn delete_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let deleted = User::delete(&state.db.pool, user.id).await.map_err(|e| match e {
        StoreError::InUse(_) => AppError::conflict("accounts with transactions cannot be deleted"),
        other => AppError::from(other),
    })?;
    if !deleted {
        return Err(AppError::not_found("user not found"));
    }
    info!(user_id = user.id, username = %user.username, "user deleted");
    Ok(respond(StatusCode::OK, "user deleted", serde_json::json!({ "id": user.id })))
}

// GET /api/v1/users
async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let users: Vec<UserResponse> = User::list(&state.db.pool)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    Ok(respond(StatusCode::OK, "users", users))
}

// GET /api/v1/users/{username}
async fn get_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = User::find_by_username(&state.db.pool, &username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user '{username}' not found")))?;
    Ok(respond(StatusCode::OK, "user", UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_not_be_empty() {
        assert!(UpdateNameRequest { name: String::new() }.validate().is_err());
        assert!(UpdateNameRequest { name: "Ana Lima".into() }.validate().is_ok());
    }

    #[test]
    fn user_responses_never_carry_the_password_hash() {
        let user = User {
            id: 1,
            name: "Ana".into(),
            username: "ana".into(),
            email: "ana@example.com".into(),
            phone: "+10000000000".into(),
            password_hash: "$2b$12$secret".into(),
            role: Role::User,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("password_hash").is_none());
    }
}
