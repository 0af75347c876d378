use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::repository::StoreError;

#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Area {
    pub id: i64,
    pub name: String,
    pub spot_count: i32,
    pub spot_per_row: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewArea {
    pub name: String,
    pub spot_count: i32,
    pub spot_per_row: i32,
}

impl Area {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Area>, sqlx::Error> {
        sqlx::query_as::<_, Area>(
            "SELECT id, name, spot_count, spot_per_row, created_at FROM areas WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Area>, sqlx::Error> {
        sqlx::query_as::<_, Area>(
            "SELECT id, name, spot_count, spot_per_row, created_at FROM areas ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    // The unique index on name settles races between two creators
    pub async fn create(pool: &PgPool, area: NewArea) -> Result<Area, StoreError> {
        sqlx::query_as::<_, Area>(
            r#"
            INSERT INTO areas (name, spot_count, spot_per_row)
            VALUES ($1, $2, $3)
            RETURNING id, name, spot_count, spot_per_row, created_at
            "#,
        )
        .bind(&area.name)
        .bind(area.spot_count)
        .bind(area.spot_per_row)
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::from_write(e, format!("area '{}'", area.name)))
    }

    /// Sessions already scheduled keep the grid they were created with.
    pub async fn update(pool: &PgPool, id: i64, area: NewArea) -> Result<Option<Area>, StoreError> {
        sqlx::query_as::<_, Area>(
            r#"
            UPDATE areas SET name = $2, spot_count = $3, spot_per_row = $4
            WHERE id = $1
            RETURNING id, name, spot_count, spot_per_row, created_at
            "#,
        )
        .bind(id)
        .bind(&area.name)
        .bind(area.spot_count)
        .bind(area.spot_per_row)
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::from_write(e, format!("area '{}'", area.name)))
    }

    /// An area with scheduled sessions is `InUse`.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM areas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| StoreError::from_delete(e, format!("area {id}")))?;
        Ok(result.rows_affected() > 0)
    }
}
