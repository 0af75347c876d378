mod common;

use chrono::Duration;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;

use cinema_booking::error::BookingError;
use cinema_booking::models::{FilmStatus, Session};
use cinema_booking::repository::SeatStore;
use common::{labels, now, request, Cinema};

async fn screening(cinema: &Cinema) -> Session {
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let area = cinema.area("Studio 1", 100, 10).await;
    cinema
        .scheduler
        .create_session_at(request(Duration::days(1), Decimal::new(1250, 2), &film, &area), now())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_of_many_bookings_gets_the_seat() {
    let cinema = Arc::new(Cinema::new());
    let session = screening(&cinema).await;

    let mut users = Vec::new();
    for i in 0..16 {
        users.push(cinema.user(&format!("user{i}")).await);
    }

    let session_id = session.id;
    let attempts = users.into_iter().map(|user| {
        let cinema = cinema.clone();
        tokio::spawn(async move {
            cinema
                .reservations
                .book(session_id, user.id, &labels(&["A1"]))
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, BookingError::Conflict(_))));

    let a1 = cinema.store.find_spot(session.id, "A", 1).await.unwrap().unwrap();
    let winner = results.iter().find_map(|r| r.as_ref().ok()).unwrap();
    assert_eq!(a1.transaction_id, Some(winner.transaction.id));
    assert_eq!(cinema.store.transaction_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn losers_of_an_overlapping_race_keep_none_of_their_seats() {
    let cinema = Arc::new(Cinema::new());
    let session = screening(&cinema).await;

    let mut users = Vec::new();
    for i in 0..8 {
        users.push(cinema.user(&format!("user{i}")).await);
    }

    // every request wants its own seat in row C plus the shared J10
    let session_id = session.id;
    let attempts = users.into_iter().enumerate().map(|(i, user)| {
        let cinema = cinema.clone();
        let seats = labels(&[format!("C{}", i + 1).as_str(), "J10"]);
        tokio::spawn(async move { cinema.reservations.book(session_id, user.id, &seats).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].transaction.total_price, Decimal::new(2500, 2));

    let bound: Vec<String> = cinema
        .store
        .list_spots(session.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|s| s.is_reserved())
        .map(|s| s.label())
        .collect();
    let expected: Vec<String> = winners[0].spots.iter().map(|s| s.label()).collect();
    assert_eq!(expected.len(), 2);
    assert_eq!(bound, expected);
    assert_eq!(cinema.store.transaction_count().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_bookings_all_succeed() {
    let cinema = Arc::new(Cinema::new());
    let session = screening(&cinema).await;
    let user_id = cinema.user("ana").await.id;
    let session_id = session.id;

    let attempts = (1..=10).map(|n| {
        let cinema = cinema.clone();
        let seats = labels(&[format!("D{n}").as_str()]);
        tokio::spawn(async move { cinema.reservations.book(session_id, user_id, &seats).await })
    });
    let results = join_all(attempts).await;

    assert!(results.into_iter().all(|joined| joined.unwrap().is_ok()));
    assert_eq!(cinema.store.transaction_count().await, 10);
}
