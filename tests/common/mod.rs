#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use cinema_booking::models::{Area, Film, FilmStatus, NewArea, NewFilm, NewUser, Role, User};
use cinema_booking::repository::{MemoryStore, ReferenceData, SeatStore};
use cinema_booking::services::{CreateSessionRequest, ReservationAuthority, SessionScheduler};

pub struct Cinema {
    pub store: Arc<MemoryStore>,
    pub scheduler: SessionScheduler,
    pub reservations: ReservationAuthority,
}

impl Cinema {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let reference: Arc<dyn ReferenceData> = store.clone();
        let seats: Arc<dyn SeatStore> = store.clone();
        Cinema {
            scheduler: SessionScheduler::new(reference, seats.clone()),
            reservations: ReservationAuthority::new(seats),
            store,
        }
    }

    pub async fn film(&self, slug: &str, status: FilmStatus) -> Film {
        self.store
            .insert_film(NewFilm {
                title: slug.replace('-', " "),
                slug: slug.to_string(),
                synopsis: "A film.".to_string(),
                duration: 120,
                genre: "Drama".to_string(),
                producer: String::new(),
                director: String::new(),
                writer: String::new(),
                production: String::new(),
                cast: String::new(),
                trailer: String::new(),
                image: String::new(),
                status,
            })
            .await
    }

    pub async fn area(&self, name: &str, spot_count: i32, spot_per_row: i32) -> Area {
        self.store
            .insert_area(NewArea {
                name: name.to_string(),
                spot_count,
                spot_per_row,
            })
            .await
    }

    pub async fn user(&self, username: &str) -> User {
        self.store
            .insert_user(NewUser {
                name: username.to_string(),
                username: username.to_string(),
                email: format!("{username}@example.com"),
                phone: "+10000000000".to_string(),
                password_hash: String::new(),
                role: Role::User,
            })
            .await
    }
}

/// Fixed clock so "future" and "past" do not depend on when the suite runs.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
}

pub fn request(offset: Duration, price: Decimal, film: &Film, area: &Area) -> CreateSessionRequest {
    CreateSessionRequest {
        time: (now() + offset).to_rfc3339(),
        price,
        film_id: film.id,
        area_id: area.id,
    }
}

pub fn labels(seats: &[&str]) -> Vec<String> {
    seats.iter().map(|s| s.to_string()).collect()
}
