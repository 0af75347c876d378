use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::Spot;

#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: i64,
    pub code: String,
    pub total_price: Decimal,
    #[sqlx(rename = "created_at")]
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub session_id: i64,
}

/// A transaction together with the spots it reserved.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub spots: Vec<Spot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub code: String,
    pub total_price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub user_id: i64,
    pub session_id: i64,
}

pub(crate) const TRANSACTION_COLUMNS: &str = "id, code, total_price, created_at, user_id, session_id";

impl Transaction {
    pub async fn list(pool: &PgPool) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
