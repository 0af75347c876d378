//! Session scheduling: validates a request and persists the session with its seat grid.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::BookingError;
use crate::models::{max_amount, NewSession, Session, AMOUNT_SCALE};
use crate::repository::{ReferenceData, SeatStore, StoreError};
use crate::services::inventory;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    /// RFC 3339 timestamp, e.g. `2030-05-01T19:30:00Z`.
    pub time: String,
    pub price: Decimal,
    pub film_id: i64,
    pub area_id: i64,
}

#[derive(Clone)]
pub struct SessionScheduler {
    reference: Arc<dyn ReferenceData>,
    seats: Arc<dyn SeatStore>,
}

impl SessionScheduler {
    pub fn new(reference: Arc<dyn ReferenceData>, seats: Arc<dyn SeatStore>) -> Self {
        Self { reference, seats }
    }

    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<Session, BookingError> {
        self.create_session_at(request, Utc::now()).await
    }

    /// Same as [`create_session`](Self::create_session) with an explicit "now".
    #[tracing::instrument(
        skip(self, request),
        fields(film_id = request.film_id, area_id = request.area_id, time = %request.time)
    )]
    pub async fn create_session_at(
        &self,
        request: CreateSessionRequest,
        now: DateTime<Utc>,
    ) -> Result<Session, BookingError> {
        let time = parse_session_time(&request.time)?;

        if request.price < Decimal::ZERO {
            return Err(BookingError::Validation(format!(
                "price must not be negative, got {}",
                request.price
            )));
        }

        if request.price.normalize().scale() > AMOUNT_SCALE {
            return Err(BookingError::Validation(format!(
                "price {} has more than {AMOUNT_SCALE} decimal places",
                request.price
            )));
        }

        if request.price > max_amount() {
            return Err(BookingError::Validation(format!(
                "price {} exceeds the maximum of {}",
                request.price,
                max_amount()
            )));
        }

        if time <= now {
            return Err(BookingError::Validation(format!(
                "session time {} is not in the future",
                time.to_rfc3339()
            )));
        }

        if self.seats.find_session_at(time, request.area_id).await?.is_some() {
            return Err(BookingError::Conflict(format!(
                "a session is already scheduled at {} in area {}",
                time.to_rfc3339(),
                request.area_id
            )));
        }

        let film = self
            .reference
            .find_film_by_id(request.film_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("film {} not found", request.film_id)))?;

        if !film.status.is_bookable() {
            return Err(BookingError::Conflict(format!(
                "film '{}' is {:?}, sessions can only be scheduled for films now playing",
                film.slug, film.status
            )));
        }

        let area = self
            .reference
            .find_area_by_id(request.area_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("area {} not found", request.area_id)))?;

        let grid = inventory::generate(area.spot_count, area.spot_per_row)?;

        let session = self
            .seats
            .create_session_with_spots(
                NewSession {
                    time,
                    price: request.price,
                    film_id: film.id,
                    area_id: area.id,
                },
                &grid,
            )
            .await
            .map_err(|err| match err {
                // lost a race with a concurrent identical request
                StoreError::Duplicate(what) => {
                    BookingError::Conflict(format!("{what} is already scheduled"))
                }
                other => BookingError::Persistence(other),
            })?;

        info!(
            session_id = session.id,
            spots = grid.len(),
            "session scheduled"
        );
        Ok(session)
    }
}

/// Parses an RFC 3339 timestamp, truncated to the microsecond precision the database keeps.
pub fn parse_session_time(raw: &str) -> Result<DateTime<Utc>, BookingError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|time| time.with_timezone(&Utc).trunc_subsecs(6))
        .map_err(|err| BookingError::Validation(format!("invalid session time '{raw}': {err}")))
}
