use crate::cache::CacheService;
use crate::models::Spot;
use crate::repository::StoreError;

fn key(session_id: i64) -> String {
    format!("seats:{session_id}")
}

impl CacheService {
    /// Every spot of the session with its binding state, ordered by row then number.
    pub async fn seat_map(&self, session_id: i64) -> Result<Vec<Spot>, StoreError> {
        let key = key(session_id);
        let (cached, generation) = self.read::<Vec<Spot>>(&key).await;
        if let Some(spots) = cached {
            return Ok(spots);
        }

        let spots = self.seats.list_spots(session_id).await?;
        if let Some(generation) = generation.filter(|_| !spots.is_empty()) {
            self.write(&key, generation, &spots, self.ttl.seat_map_ttl).await;
        }
        Ok(spots)
    }

    pub async fn invalidate_seat_map(&self, session_id: i64) {
        self.invalidate(&key(session_id)).await;
    }
}
