use crate::cache::CacheService;
use crate::models::{Film, FilmStatus};
use crate::repository::StoreError;

const NOW_PLAYING_KEY: &str = "films:now_playing";

impl CacheService {
    pub async fn now_playing_films(&self) -> Result<Vec<Film>, StoreError> {
        let (cached, generation) = self.read::<Vec<Film>>(NOW_PLAYING_KEY).await;
        if let Some(films) = cached {
            return Ok(films);
        }

        let films = Film::list(&self.db.pool, Some(FilmStatus::NowPlaying)).await?;
        if let Some(generation) = generation {
            self.write(NOW_PLAYING_KEY, generation, &films, self.ttl.films_ttl).await;
        }
        Ok(films)
    }

    pub async fn invalidate_films(&self) {
        self.invalidate(NOW_PLAYING_KEY).await;
    }
}
