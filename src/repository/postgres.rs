use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};

use super::{ReferenceData, SeatStore, StoreError};
use crate::models::{
    session::SESSION_COLUMNS, transaction::TRANSACTION_COLUMNS, Area, Film, NewSession,
    NewTransaction, Session, Spot, SpotSeed, Transaction, TransactionDetail, User,
};

// Rows sort A..Z before AA..ZZ
const SPOT_ORDER: &str = "ORDER BY length(seat_row), seat_row, number";
const SPOT_COLUMNS: &str = "id, session_id, seat_row, number, transaction_id";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReferenceData for PgStore {
    async fn find_film_by_id(&self, id: i64) -> Result<Option<Film>, StoreError> {
        Ok(Film::find_by_id(&self.pool, id).await?)
    }

    async fn find_area_by_id(&self, id: i64) -> Result<Option<Area>, StoreError> {
        Ok(Area::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }
}

#[async_trait]
impl SeatStore for PgStore {
    async fn find_session(&self, id: i64) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn find_session_at(
        &self,
        time: DateTime<Utc>,
        area_id: i64,
    ) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE starts_at = $1 AND area_id = $2"
        ))
        .bind(time)
        .bind(area_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn create_session_with_spots(
        &self,
        session: NewSession,
        grid: &[SpotSeed],
    ) -> Result<Session, StoreError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO sessions (starts_at, price, film_id, area_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.time)
        .bind(session.price)
        .bind(session.film_id)
        .bind(session.area_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            StoreError::from_write(
                e,
                format!("session at {} in area {}", session.time.to_rfc3339(), session.area_id),
            )
        })?;

        if !grid.is_empty() {
            let rows: Vec<String> = grid.iter().map(|seed| seed.row.clone()).collect();
            let numbers: Vec<i32> = grid.iter().map(|seed| seed.number).collect();

            // One statement for the whole grid
            let inserted = sqlx::query(
                r#"
                INSERT INTO spots (session_id, seat_row, number)
                SELECT $1, g.seat_row, g.number
                FROM UNNEST($2::text[], $3::int4[]) AS g(seat_row, number)
                "#,
            )
            .bind(created.id)
            .bind(rows)
            .bind(numbers)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted != grid.len() as u64 {
                warn!(
                    session_id = created.id,
                    expected = grid.len(),
                    inserted,
                    "spot grid insert came up short, rolling back"
                );
                if let Err(e) = tx.rollback().await {
                    warn!(session_id = created.id, error = %e, "rollback after short grid insert failed");
                }
                return Err(StoreError::Unavailable(format!(
                    "inserted {inserted} of {} spots",
                    grid.len()
                )));
            }
        }

        tx.commit().await?;
        debug!(session_id = created.id, spots = grid.len(), "session and spot grid committed");
        Ok(created)
    }

    async fn delete_session(&self, id: i64) -> Result<bool, StoreError> {
        // spots go with the session through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::from_delete(e, format!("session {id}")))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_spot(
        &self,
        session_id: i64,
        row: &str,
        number: i32,
    ) -> Result<Option<Spot>, StoreError> {
        let spot = sqlx::query_as::<_, Spot>(&format!(
            "SELECT {SPOT_COLUMNS} FROM spots WHERE session_id = $1 AND seat_row = $2 AND number = $3"
        ))
        .bind(session_id)
        .bind(row)
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(spot)
    }

    async fn list_spots(&self, session_id: i64) -> Result<Vec<Spot>, StoreError> {
        let spots = sqlx::query_as::<_, Spot>(&format!(
            "SELECT {SPOT_COLUMNS} FROM spots WHERE session_id = $1 {SPOT_ORDER}"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(spots)
    }

    async fn commit_reservation(
        &self,
        transaction: NewTransaction,
        spot_ids: &[i64],
    ) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock in id order so overlapping bookings queue instead of deadlocking
        sqlx::query("SELECT id FROM spots WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(spot_ids)
            .execute(&mut *tx)
            .await?;

        let transaction_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO transactions (code, total_price, created_at, user_id, session_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&transaction.code)
        .bind(transaction.total_price)
        .bind(transaction.timestamp)
        .bind(transaction.user_id)
        .bind(transaction.session_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, format!("transaction '{}'", transaction.code)))?;

        // Conditional claim: a spot bound by someone else is simply not returned
        let claimed: Vec<i64> = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE spots
            SET transaction_id = $1
            WHERE id = ANY($2) AND transaction_id IS NULL
            RETURNING id
            "#,
        )
        .bind(transaction_id)
        .bind(spot_ids)
        .fetch_all(&mut *tx)
        .await?;

        if claimed.len() != spot_ids.len() {
            let lost = spot_ids
                .iter()
                .copied()
                .find(|id| !claimed.contains(id))
                .unwrap_or_default();
            // the lost seat is the answer even if the rollback itself fails
            if let Err(e) = tx.rollback().await {
                warn!(spot_id = lost, error = %e, "rollback after lost seat race failed");
            }
            debug!(spot_id = lost, "reservation lost a seat race, rolled back");
            return Err(StoreError::SpotTaken { spot_id: lost });
        }

        tx.commit().await?;
        Ok(transaction_id)
    }

    async fn find_transaction(&self, id: i64) -> Result<Option<TransactionDetail>, StoreError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(transaction) = transaction else {
            return Ok(None);
        };

        let spots = sqlx::query_as::<_, Spot>(&format!(
            "SELECT {SPOT_COLUMNS} FROM spots WHERE transaction_id = $1 {SPOT_ORDER}"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(TransactionDetail { transaction, spots }))
    }
}
