//! Redis read-through cache for seat maps and the now-playing film list.
//!
//! Redis is never the source of truth. A cache miss or a Redis failure falls back to
//! the database, and every write that changes cached data drops the affected key.
//! Each key has a `{key}:gen` counter; entries carry the generation they were loaded
//! under and stop counting once it moves on.

use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::CacheConfig, database::Database, redis_client::RedisClient, repository::SeatStore,
};

pub mod films;
pub mod seats;

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
    seats: Arc<dyn SeatStore>,
    ttl: CacheConfig,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database, seats: Arc<dyn SeatStore>, ttl: CacheConfig) -> Self {
        Self {
            redis,
            db,
            seats,
            ttl,
        }
    }

    /// Loads the film list and the seat maps of upcoming sessions.
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup");

        match self.now_playing_films().await {
            Ok(films) => info!(films = films.len(), "film list cached"),
            Err(e) => warn!(error = %e, "film list warmup failed"),
        }

        match crate::models::Session::list_upcoming(&self.db.pool).await {
            Ok(sessions) => {
                for session in &sessions {
                    if let Err(e) = self.seat_map(session.id).await {
                        warn!(session_id = session.id, error = %e, "seat map warmup failed");
                    }
                }
                info!(sessions = sessions.len(), "seat maps cached");
            }
            Err(e) => warn!(error = %e, "could not list upcoming sessions for warmup"),
        }

        info!("Cache warmup done");
    }

    /// Looks `key` up together with its generation counter.
    ///
    /// A miss still reports the generation seen, which the caller hands back to
    /// [`write`](Self::write) once it has loaded the value. `None` means Redis could not
    /// be read, so nothing should be written either.
    async fn read<T: DeserializeOwned>(&self, key: &str) -> (Option<T>, Option<u64>) {
        let mut conn = self.redis.conn.clone();
        let (data, generation): (Option<String>, Option<u64>) =
            match conn.mget(vec![key.to_string(), generation_key(key)]).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(key, error = %e, "cache read failed");
                    return (None, None);
                }
            };
        let generation = generation.unwrap_or(0);

        let Some(data) = data else {
            return (None, Some(generation));
        };
        match serde_json::from_str::<Entry<T>>(&data) {
            Ok(entry) => (fresh(Some(entry), generation), Some(generation)),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                self.invalidate(key).await;
                (None, None)
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, generation: u64, value: &T, ttl_seconds: u64) {
        let data = match serde_json::to_string(&Entry { generation, value }) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "cache entry not serializable");
                return;
            }
        };

        let mut conn = self.redis.conn.clone();
        let result: redis::RedisResult<()> = conn.set_ex(key, data, ttl_seconds).await;
        if let Err(e) = result {
            warn!(key, error = %e, "cache write failed");
        }
    }

    /// Bumps the generation before dropping the entry, so a reader that loaded from the
    /// database before the change can no longer publish what it loaded.
    async fn invalidate(&self, key: &str) {
        let mut conn = self.redis.conn.clone();
        let result: redis::RedisResult<()> = redis::pipe()
            .atomic()
            .incr(generation_key(key), 1)
            .ignore()
            .del(key)
            .ignore()
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            warn!(key, error = %e, "cache invalidation failed");
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry<T> {
    generation: u64,
    value: T,
}

fn generation_key(key: &str) -> String {
    format!("{key}:gen")
}

/// An entry only counts while nothing has invalidated its key since it was loaded.
fn fresh<T>(entry: Option<Entry<T>>, generation: u64) -> Option<T> {
    entry
        .filter(|entry| entry.generation == generation)
        .map(|entry| entry.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_from_the_current_generation_are_served() {
        let entry = Entry { generation: 3, value: vec![1, 2] };
        assert_eq!(fresh(Some(entry), 3), Some(vec![1, 2]));
    }

    #[test]
    fn entries_loaded_before_an_invalidation_are_ignored() {
        // loaded at generation 0, invalidated once while the load was in flight
        let entry = Entry { generation: 0, value: "stale" };
        assert_eq!(fresh(Some(entry), 1), None);
        assert_eq!(fresh::<&str>(None, 0), None);
    }

    #[test]
    fn entries_keep_their_generation_through_json() {
        let json = serde_json::to_string(&Entry { generation: 7, value: "x" }).unwrap();
        let entry: Entry<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(fresh(Some(entry), 7).as_deref(), Some("x"));
    }

    #[test]
    fn generation_counters_sit_next_to_their_key() {
        assert_eq!(generation_key("seats:42"), "seats:42:gen");
    }
}
