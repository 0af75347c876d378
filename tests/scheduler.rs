mod common;

use chrono::Duration;
use rust_decimal::Decimal;

use cinema_booking::error::BookingError;
use cinema_booking::models::{max_amount, FilmStatus};
use cinema_booking::repository::{MemoryStore, SeatStore};
use common::{now, request, Cinema};

#[tokio::test]
async fn session_gets_a_full_grid_of_free_spots() {
    let cinema = Cinema::new();
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let area = cinema.area("Studio 1", 20, 10).await;

    let session = cinema
        .scheduler
        .create_session_at(request(Duration::days(1), Decimal::new(5000, 2), &film, &area), now())
        .await
        .unwrap();

    assert_eq!(session.film_id, film.id);
    assert_eq!(session.area_id, area.id);
    assert_eq!(session.price, Decimal::new(5000, 2));
    assert_eq!(session.time, now() + Duration::days(1));

    let spots = cinema.store.list_spots(session.id).await.unwrap();
    assert_eq!(spots.len(), 20);
    let labels: Vec<String> = spots.iter().map(|s| s.label()).collect();
    assert_eq!(labels.first().map(String::as_str), Some("A1"));
    assert_eq!(labels[9], "A10");
    assert_eq!(labels[10], "B1");
    assert_eq!(labels.last().map(String::as_str), Some("B10"));
    assert!(spots.iter().all(|s| !s.is_reserved() && s.session_id == session.id));
}

#[tokio::test]
async fn films_not_playing_get_no_sessions() {
    let cinema = Cinema::new();
    let area = cinema.area("Studio 1", 20, 10).await;

    for (slug, status) in [
        ("coming-soon", FilmStatus::ComingSoon),
        ("not-playing", FilmStatus::NotPlaying),
    ] {
        let film = cinema.film(slug, status).await;
        let err = cinema
            .scheduler
            .create_session_at(request(Duration::days(1), Decimal::ONE, &film, &area), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)), "{slug}: {err:?}");
    }

    assert_eq!(cinema.store.session_count().await, 0);
    assert_eq!(cinema.store.spot_count().await, 0);
}

#[tokio::test]
async fn past_and_present_times_are_rejected() {
    let cinema = Cinema::new();
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let area = cinema.area("Studio 1", 20, 10).await;

    for offset in [Duration::hours(-3), Duration::zero()] {
        let err = cinema
            .scheduler
            .create_session_at(request(offset, Decimal::ONE, &film, &area), now())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)), "{err:?}");
    }

    assert_eq!(cinema.store.session_count().await, 0);
}

#[tokio::test]
async fn malformed_time_and_negative_price_are_validation_errors() {
    let cinema = Cinema::new();
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let area = cinema.area("Studio 1", 20, 10).await;

    let mut bad_time = request(Duration::days(1), Decimal::ONE, &film, &area);
    bad_time.time = "next friday".to_string();
    assert!(matches!(
        cinema.scheduler.create_session_at(bad_time, now()).await,
        Err(BookingError::Validation(_))
    ));

    let negative = request(Duration::days(1), Decimal::new(-100, 2), &film, &area);
    assert!(matches!(
        cinema.scheduler.create_session_at(negative, now()).await,
        Err(BookingError::Validation(_))
    ));

    let free = request(Duration::days(1), Decimal::ZERO, &film, &area);
    assert!(cinema.scheduler.create_session_at(free, now()).await.is_ok());
}

#[tokio::test]
async fn prices_must_fit_the_money_columns() {
    let cinema = Cinema::new();
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let area = cinema.area("Studio 1", 20, 10).await;

    let sub_cent = request(Duration::days(1), Decimal::new(10_005, 3), &film, &area);
    assert!(matches!(
        cinema.scheduler.create_session_at(sub_cent, now()).await,
        Err(BookingError::Validation(_))
    ));

    let trillion = request(Duration::days(2), Decimal::new(1_000_000_000_000, 0), &film, &area);
    assert!(matches!(
        cinema.scheduler.create_session_at(trillion, now()).await,
        Err(BookingError::Validation(_))
    ));
    assert_eq!(cinema.store.session_count().await, 0);

    // trailing zeros are not extra precision
    let padded = request(Duration::days(3), Decimal::new(12_500, 3), &film, &area);
    assert!(cinema.scheduler.create_session_at(padded, now()).await.is_ok());

    let ceiling = request(Duration::days(4), max_amount(), &film, &area);
    let session = cinema.scheduler.create_session_at(ceiling, now()).await.unwrap();
    assert_eq!(session.price, max_amount());
}

#[tokio::test]
async fn same_time_and_area_is_a_conflict() {
    let cinema = Cinema::new();
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let other = cinema.film("past-lives", FilmStatus::NowPlaying).await;
    let area = cinema.area("Studio 1", 20, 10).await;
    let second_area = cinema.area("Studio 2", 10, 5).await;

    cinema
        .scheduler
        .create_session_at(request(Duration::days(1), Decimal::ONE, &film, &area), now())
        .await
        .unwrap();

    let err = cinema
        .scheduler
        .create_session_at(request(Duration::days(1), Decimal::ONE, &other, &area), now())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Conflict(_)), "{err:?}");

    // the same slot in another room is fine
    cinema
        .scheduler
        .create_session_at(request(Duration::days(1), Decimal::ONE, &film, &second_area), now())
        .await
        .unwrap();

    assert_eq!(cinema.store.session_count().await, 2);
    assert_eq!(cinema.store.spot_count().await, 30);
}

#[tokio::test]
async fn missing_film_or_area_is_not_found() {
    let cinema = Cinema::new();
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let area = cinema.area("Studio 1", 20, 10).await;

    let mut missing_film = request(Duration::days(1), Decimal::ONE, &film, &area);
    missing_film.film_id = 9_999;
    assert!(matches!(
        cinema.scheduler.create_session_at(missing_film, now()).await,
        Err(BookingError::NotFound(_))
    ));

    let mut missing_area = request(Duration::days(1), Decimal::ONE, &film, &area);
    missing_area.area_id = 9_999;
    assert!(matches!(
        cinema.scheduler.create_session_at(missing_area, now()).await,
        Err(BookingError::NotFound(_))
    ));

    assert_eq!(cinema.store.session_count().await, 0);
}

#[tokio::test]
async fn a_failed_grid_insert_leaves_nothing_behind() {
    let cinema = Cinema::with_store(MemoryStore::failing_spot_insert_at(7));
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let area = cinema.area("Studio 1", 20, 10).await;

    let err = cinema
        .scheduler
        .create_session_at(request(Duration::days(1), Decimal::ONE, &film, &area), now())
        .await
        .unwrap_err();

    assert!(matches!(err, BookingError::Persistence(_)), "{err:?}");
    assert_eq!(cinema.store.session_count().await, 0);
    assert_eq!(cinema.store.spot_count().await, 0);
}

#[tokio::test]
async fn remainder_seats_are_not_generated() {
    let cinema = Cinema::new();
    let film = cinema.film("dune-part-two", FilmStatus::NowPlaying).await;
    let area = cinema.area("Odd Room", 25, 10).await;

    let session = cinema
        .scheduler
        .create_session_at(request(Duration::days(1), Decimal::ONE, &film, &area), now())
        .await
        .unwrap();

    let spots = cinema.store.list_spots(session.id).await.unwrap();
    assert_eq!(spots.len(), 20);
    assert!(spots.iter().all(|s| s.row == "A" || s.row == "B"));
}
