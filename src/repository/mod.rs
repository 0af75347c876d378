//! Storage seams for the booking core.
//!
//! `ReferenceData` is the read-only view of areas, films and users the core consults.
//! `SeatStore` owns sessions, spots and transactions and is the only place a spot is
//! ever bound to a transaction. Both are implemented by [`postgres::PgStore`] in
//! production and by `memory::MemoryStore` in tests (behind the `test-util` feature).

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    Area, Film, NewSession, NewTransaction, Session, Spot, SpotSeed, TransactionDetail, User,
};

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} already exists")]
    Duplicate(String),
    #[error("spot {spot_id} is already bound to a transaction")]
    SpotTaken { spot_id: i64 },
    #[error("{0} is still referenced")]
    InUse(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Classifies a failed insert, turning unique-constraint violations into `Duplicate`.
    pub fn from_write(err: sqlx::Error, what: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(what.into())
            }
            _ => StoreError::Database(err),
        }
    }

    /// Classifies a failed delete, turning foreign-key violations into `InUse`.
    pub fn from_delete(err: sqlx::Error, what: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                StoreError::InUse(what.into())
            }
            _ => StoreError::Database(err),
        }
    }
}

#[async_trait]
pub trait ReferenceData: Send + Sync {
    async fn find_film_by_id(&self, id: i64) -> Result<Option<Film>, StoreError>;
    async fn find_area_by_id(&self, id: i64) -> Result<Option<Area>, StoreError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait SeatStore: Send + Sync {
    async fn find_session(&self, id: i64) -> Result<Option<Session>, StoreError>;

    async fn find_session_at(
        &self,
        time: DateTime<Utc>,
        area_id: i64,
    ) -> Result<Option<Session>, StoreError>;

    /// Persists the session and its whole seat grid as one unit.
    ///
    /// Either every spot exists afterwards or neither the session nor any spot does.
    /// A session already scheduled at the same time in the same area yields `Duplicate`.
    async fn create_session_with_spots(
        &self,
        session: NewSession,
        grid: &[SpotSeed],
    ) -> Result<Session, StoreError>;

    async fn delete_session(&self, id: i64) -> Result<bool, StoreError>;

    async fn find_spot(
        &self,
        session_id: i64,
        row: &str,
        number: i32,
    ) -> Result<Option<Spot>, StoreError>;

    async fn list_spots(&self, session_id: i64) -> Result<Vec<Spot>, StoreError>;

    /// Inserts the transaction and claims every spot in `spot_ids` for it.
    ///
    /// A claim only succeeds on a spot that is still unbound. If any claim fails the
    /// transaction row and every claim made by this call are undone and
    /// `SpotTaken` names the first spot that was lost.
    async fn commit_reservation(
        &self,
        transaction: NewTransaction,
        spot_ids: &[i64],
    ) -> Result<i64, StoreError>;

    async fn find_transaction(&self, id: i64) -> Result<Option<TransactionDetail>, StoreError>;
}
