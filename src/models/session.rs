use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Session {
    pub id: i64,
    #[sqlx(rename = "starts_at")]
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub film_id: i64,
    pub area_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub film_id: i64,
    pub area_id: i64,
}

/// Fractional digits kept by the `NUMERIC(12, 2)` money columns.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest amount the money columns hold: 999 999 999 999.99.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, AMOUNT_SCALE)
}

pub(crate) const SESSION_COLUMNS: &str = "id, starts_at, price, film_id, area_id, created_at";

impl Session {
    pub async fn list(pool: &PgPool) -> Result<Vec<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY starts_at"
        ))
        .fetch_all(pool)
        .await
    }

    /// Future sessions whose film is currently playing.
    pub async fn list_upcoming(pool: &PgPool) -> Result<Vec<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT s.id, s.starts_at, s.price, s.film_id, s.area_id, s.created_at
            FROM sessions s
            JOIN films f ON f.id = s.film_id
            WHERE f.status = 'NowPlaying' AND s.starts_at > NOW()
            ORDER BY s.starts_at
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_film(pool: &PgPool, film_id: i64) -> Result<Vec<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE film_id = $1 AND starts_at > NOW() ORDER BY starts_at"
        ))
        .bind(film_id)
        .fetch_all(pool)
        .await
    }
}
