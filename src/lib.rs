pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod repository;
pub mod services;

use std::sync::Arc;
use tokio::task;

use repository::{PgStore, ReferenceData, SeatStore};
use services::{ReservationAuthority, SessionScheduler, TokenService};

// Shared state for every request handler
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub store: Arc<PgStore>,
    pub cache: cache::CacheService,
    pub tokens: Arc<TokenService>,
    pub scheduler: SessionScheduler,
    pub reservations: ReservationAuthority,
    pub config: config::Config,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database).await?;
        db.run_migrations().await?;
        tracing::info!("Database connected and migrated");

        let redis = redis_client::RedisClient::new(&config.redis).await?;
        tracing::info!("Redis connected");

        let store = Arc::new(PgStore::new(db.pool.clone()));
        let reference: Arc<dyn ReferenceData> = store.clone();
        let seats: Arc<dyn SeatStore> = store.clone();

        let cache = cache::CacheService::new(
            redis.clone(),
            db.clone(),
            seats.clone(),
            config.cache.clone(),
        );

        let state = Arc::new(Self {
            tokens: Arc::new(TokenService::new(&config.jwt)),
            scheduler: SessionScheduler::new(reference, seats.clone()),
            reservations: ReservationAuthority::new(seats),
            db,
            redis,
            store,
            cache,
            config,
        });

        let state_for_bg = state.clone();
        task::spawn(async move {
            state_for_bg.cache.warmup_cache().await;
        });

        Ok(state)
    }
}
