use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{StreamExt, TryStreamExt, stream};
use metrics::histogram;
use thiserror::Error;
use tracing::info;

use crate::{
    application::repos::{RepoError, SongsRepo},
    cache::{CacheError, SongCache},
    domain::songs::Song,
};

#[derive(Debug, Error)]
pub enum CacheWarmError {
    #[error("failed to load songs from the store")]
    Load(#[source] RepoError),
    #[error("failed to cache song {id}")]
    Cache {
        id: i64,
        #[source]
        source: CacheError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmReport {
    pub songs: usize,
    pub elapsed: Duration,
}

/// Copies every stored song into the cache.
pub struct CacheWarmer {
    reader: Arc<dyn SongsRepo>,
    cache: SongCache,
    concurrency: NonZeroUsize,
}

impl CacheWarmer {
    pub fn new(reader: Arc<dyn SongsRepo>, cache: SongCache, concurrency: NonZeroUsize) -> Self {
        Self {
            reader,
            cache,
            concurrency,
        }
    }

    /// Stops at the first song that cannot be cached.
    pub async fn warm_initial(&self) -> Result<WarmReport, CacheWarmError> {
        info!(target = "songbook::cache_warmer", "warming song cache");
        let started = Instant::now();

        let songs = self
            .reader
            .get_all_songs()
            .await
            .map_err(CacheWarmError::Load)?;
        let total = songs.len();

        let cache = &self.cache;
        stream::iter(songs)
            .map(Ok::<Song, CacheWarmError>)
            .try_for_each_concurrent(self.concurrency.get(), |song| async move {
                cache
                    .set(&song)
                    .await
                    .map_err(|source| CacheWarmError::Cache {
                        id: song.id,
                        source,
                    })
            })
            .await?;

        let elapsed = started.elapsed();
        histogram!("songbook_cache_warm_ms").record(elapsed.as_secs_f64() * 1000.0);
        info!(
            target = "songbook::cache_warmer",
            songs = total,
            elapsed_ms = elapsed.as_millis() as u64,
            "song cache warmed"
        );

        Ok(WarmReport {
            songs: total,
            elapsed,
        })
    }
}
