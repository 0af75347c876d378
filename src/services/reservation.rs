//! Seat reservation.
//!
//! A booking resolves every requested label to a spot of the session, prices the
//! selection and hands the spot ids to [`SeatStore::commit_reservation`], which claims
//! them all or none. The pre-checks here only produce friendly errors; the claim in
//! the store is what actually keeps two bookings from sharing a seat.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{max_amount, NewTransaction, SeatLabel, Spot, TransactionDetail};
use crate::repository::{SeatStore, StoreError};

#[derive(Clone)]
pub struct ReservationAuthority {
    seats: Arc<dyn SeatStore>,
}

impl ReservationAuthority {
    pub fn new(seats: Arc<dyn SeatStore>) -> Self {
        Self { seats }
    }

    #[tracing::instrument(skip(self, seat_labels), fields(seats = seat_labels.len()))]
    pub async fn book(
        &self,
        session_id: i64,
        user_id: i64,
        seat_labels: &[String],
    ) -> Result<TransactionDetail, BookingError> {
        if seat_labels.is_empty() {
            return Err(BookingError::Validation(
                "at least one seat must be selected".to_string(),
            ));
        }

        let session = self
            .seats
            .find_session(session_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("session {session_id} not found")))?;

        let spots = self.resolve(session.id, seat_labels).await?;

        let total_price = session
            .price
            .checked_mul(Decimal::from(spots.len() as u64))
            .filter(|total| *total <= max_amount())
            .ok_or_else(|| {
                BookingError::Validation(format!(
                    "{} seats at {} exceed the largest payable total of {}",
                    spots.len(),
                    session.price,
                    max_amount()
                ))
            })?;
        let code = Uuid::new_v4().to_string();
        let spot_ids: Vec<i64> = spots.iter().map(|spot| spot.id).collect();

        let transaction_id = self
            .seats
            .commit_reservation(
                NewTransaction {
                    code: code.clone(),
                    total_price,
                    timestamp: Utc::now(),
                    user_id,
                    session_id: session.id,
                },
                &spot_ids,
            )
            .await
            .map_err(|err| match err {
                StoreError::SpotTaken { spot_id } => {
                    let label = spots
                        .iter()
                        .find(|spot| spot.id == spot_id)
                        .map(Spot::label)
                        .unwrap_or_else(|| spot_id.to_string());
                    warn!(session_id, seat = %label, "seat taken by a concurrent booking");
                    BookingError::Conflict(format!("seat {label} is reserved"))
                }
                other => BookingError::Persistence(other),
            })?;

        let detail = self
            .seats
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| {
                BookingError::Persistence(StoreError::Unavailable(format!(
                    "transaction {transaction_id} vanished after commit"
                )))
            })?;

        info!(
            transaction_id,
            code = %code,
            session_id,
            user_id,
            total_price = %total_price,
            "seats booked"
        );
        Ok(detail)
    }

    /// Turns labels into the session's free spots, in request order.
    async fn resolve(
        &self,
        session_id: i64,
        seat_labels: &[String],
    ) -> Result<Vec<Spot>, BookingError> {
        let mut seen: HashSet<SeatLabel> = HashSet::with_capacity(seat_labels.len());
        let mut resolved: HashMap<i64, Spot> = HashMap::with_capacity(seat_labels.len());
        let mut ordered = Vec::with_capacity(seat_labels.len());

        for raw in seat_labels {
            let label: SeatLabel = raw
                .parse()
                .map_err(|err| BookingError::Validation(format!("{err}")))?;

            if !seen.insert(label.clone()) {
                return Err(BookingError::Validation(format!(
                    "seat {label} is requested more than once"
                )));
            }

            let spot = self
                .seats
                .find_spot(session_id, &label.row, label.number)
                .await?
                .ok_or_else(|| {
                    BookingError::NotFound(format!(
                        "seat {label} does not exist in session {session_id}"
                    ))
                })?;

            if spot.is_reserved() {
                return Err(BookingError::Conflict(format!("seat {label} is reserved")));
            }

            ordered.push(spot.id);
            resolved.insert(spot.id, spot);
        }

        Ok(ordered
            .into_iter()
            .filter_map(|id| resolved.remove(&id))
            .collect())
    }
}
