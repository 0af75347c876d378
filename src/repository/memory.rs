//! In-process store used by the test suite.
//!
//! Every operation runs under one async mutex, so a commit observes and changes spot
//! state as a single step, mirroring what the row locks give `PgStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

use super::{ReferenceData, SeatStore, StoreError};
use crate::models::{
    Area, Film, NewArea, NewFilm, NewSession, NewTransaction, NewUser, Session, Spot, SpotSeed,
    Transaction, TransactionDetail, User,
};

#[derive(Default)]
struct State {
    next_id: i64,
    films: HashMap<i64, Film>,
    areas: HashMap<i64, Area>,
    users: HashMap<i64, User>,
    sessions: BTreeMap<i64, Session>,
    spots: BTreeMap<i64, Spot>,
    transactions: BTreeMap<i64, Transaction>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn ordered_spots(&self, keep: impl Fn(&Spot) -> bool) -> Vec<Spot> {
        let mut spots: Vec<Spot> = self.spots.values().filter(|s| keep(s)).cloned().collect();
        spots.sort_by(|a, b| {
            (a.row.len(), &a.row, a.number).cmp(&(b.row.len(), &b.row, b.number))
        });
        spots
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_spot_insert_at: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose grid inserts fail once `index` spots of a session have been written.
    pub fn failing_spot_insert_at(index: usize) -> Self {
        Self {
            fail_spot_insert_at: Some(index),
            ..Self::default()
        }
    }

    pub async fn insert_film(&self, film: NewFilm) -> Film {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let film = Film {
            id,
            title: film.title,
            slug: film.slug,
            synopsis: film.synopsis,
            duration: film.duration,
            genre: film.genre,
            producer: film.producer,
            director: film.director,
            writer: film.writer,
            production: film.production,
            cast: film.cast,
            trailer: film.trailer,
            image: film.image,
            status: film.status,
            created_at: Utc::now(),
        };
        state.films.insert(id, film.clone());
        film
    }

    pub async fn insert_area(&self, area: NewArea) -> Area {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let area = Area {
            id,
            name: area.name,
            spot_count: area.spot_count,
            spot_per_row: area.spot_per_row,
            created_at: Utc::now(),
        };
        state.areas.insert(id, area.clone());
        area
    }

    pub async fn insert_user(&self, user: NewUser) -> User {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let user = User {
            id,
            name: user.name,
            username: user.username,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.insert(id, user.clone());
        user
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn spot_count(&self) -> usize {
        self.state.lock().await.spots.len()
    }

    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }
}

#[async_trait]
impl ReferenceData for MemoryStore {
    async fn find_film_by_id(&self, id: i64) -> Result<Option<Film>, StoreError> {
        Ok(self.state.lock().await.films.get(&id).cloned())
    }

    async fn find_area_by_id(&self, id: i64) -> Result<Option<Area>, StoreError> {
        Ok(self.state.lock().await.areas.get(&id).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl SeatStore for MemoryStore {
    async fn find_session(&self, id: i64) -> Result<Option<Session>, StoreError> {
        Ok(self.state.lock().await.sessions.get(&id).cloned())
    }

    async fn find_session_at(
        &self,
        time: DateTime<Utc>,
        area_id: i64,
    ) -> Result<Option<Session>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.time == time && s.area_id == area_id)
            .cloned())
    }

    async fn create_session_with_spots(
        &self,
        session: NewSession,
        grid: &[SpotSeed],
    ) -> Result<Session, StoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state
            .sessions
            .values()
            .any(|s| s.time == session.time && s.area_id == session.area_id)
        {
            return Err(StoreError::Duplicate(format!(
                "session at {} in area {}",
                session.time.to_rfc3339(),
                session.area_id
            )));
        }

        // Stage everything first; state is only touched once the whole grid is ready
        let session_id = state.next_id();
        let mut staged = Vec::with_capacity(grid.len());
        for (index, seed) in grid.iter().enumerate() {
            if self.fail_spot_insert_at == Some(index) {
                return Err(StoreError::Unavailable(format!(
                    "spot insert {index} of session {session_id} failed"
                )));
            }
            staged.push(Spot {
                id: state.next_id(),
                session_id,
                row: seed.row.clone(),
                number: seed.number,
                transaction_id: None,
            });
        }

        let created = Session {
            id: session_id,
            time: session.time,
            price: session.price,
            film_id: session.film_id,
            area_id: session.area_id,
            created_at: Utc::now(),
        };
        state.sessions.insert(session_id, created.clone());
        for spot in staged {
            state.spots.insert(spot.id, spot);
        }
        Ok(created)
    }

    async fn delete_session(&self, id: i64) -> Result<bool, StoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.transactions.values().any(|t| t.session_id == id) {
            return Err(StoreError::InUse(format!("session {id}")));
        }
        if state.sessions.remove(&id).is_none() {
            return Ok(false);
        }
        state.spots.retain(|_, spot| spot.session_id != id);
        Ok(true)
    }

    async fn find_spot(
        &self,
        session_id: i64,
        row: &str,
        number: i32,
    ) -> Result<Option<Spot>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .spots
            .values()
            .find(|s| s.session_id == session_id && s.row == row && s.number == number)
            .cloned())
    }

    async fn list_spots(&self, session_id: i64) -> Result<Vec<Spot>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.ordered_spots(|s| s.session_id == session_id))
    }

    async fn commit_reservation(
        &self,
        transaction: NewTransaction,
        spot_ids: &[i64],
    ) -> Result<i64, StoreError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        if state.transactions.values().any(|t| t.code == transaction.code) {
            return Err(StoreError::Duplicate(format!("transaction '{}'", transaction.code)));
        }

        let transaction_id = state.next_id();
        state.transactions.insert(
            transaction_id,
            Transaction {
                id: transaction_id,
                code: transaction.code,
                total_price: transaction.total_price,
                timestamp: transaction.timestamp,
                user_id: transaction.user_id,
                session_id: transaction.session_id,
            },
        );

        let mut claimed: Vec<i64> = Vec::with_capacity(spot_ids.len());
        for &spot_id in spot_ids {
            let free = state
                .spots
                .get(&spot_id)
                .is_some_and(|spot| spot.transaction_id.is_none());

            if !free {
                // Compensate: hand back what this attempt already took
                for id in &claimed {
                    if let Some(spot) = state.spots.get_mut(id) {
                        spot.transaction_id = None;
                    }
                }
                state.transactions.remove(&transaction_id);
                return Err(StoreError::SpotTaken { spot_id });
            }

            if let Some(spot) = state.spots.get_mut(&spot_id) {
                spot.transaction_id = Some(transaction_id);
            }
            claimed.push(spot_id);
        }

        Ok(transaction_id)
    }

    async fn find_transaction(&self, id: i64) -> Result<Option<TransactionDetail>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.transactions.get(&id).cloned().map(|transaction| TransactionDetail {
            spots: state.ordered_spots(|s| s.transaction_id == Some(id)),
            transaction,
        }))
    }
}
