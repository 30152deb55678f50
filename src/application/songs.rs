//! Song catalog coordination.
//!
//! Writes commit to the relational store first and are then mirrored into the cache. The mirror
//! outcome travels back to the caller in a [`MirroredWrite`] so a cache failure is observable
//! without ever failing the primary operation. Verse reads consult the cache first and fall back
//! to the store.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::info::{InfoError, SongInfoProvider};
use crate::application::repos::{PageRequest, RepoError, SongsRepo, SongsWriteRepo};
use crate::cache::{CacheError, SongCache};
use crate::domain::error::DomainError;
use crate::domain::songs::{Song, SongField};

#[derive(Debug, Error)]
pub enum SongServiceError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("song info lookup failed")]
    Upstream(#[source] InfoError),
    #[error("song store failed")]
    Store(#[source] RepoError),
    #[error("song {id} does not exist")]
    NotFoundOnDelete { id: i64 },
    #[error("song {id} does not exist")]
    NotFound { id: i64 },
}

/// What happened to the cache after the primary write succeeded.
#[derive(Debug)]
pub enum MirrorOutcome {
    Applied,
    /// Nothing changed in the store, so the cache was left alone.
    Skipped,
    Failed(CacheError),
}

/// Result of a store write together with the cache mirror outcome.
#[must_use = "mirror failures must be reported"]
#[derive(Debug)]
pub struct MirroredWrite<T> {
    pub primary: T,
    pub mirror: MirrorOutcome,
}

impl<T> MirroredWrite<T> {
    fn new(primary: T, mirror: Result<(), CacheError>) -> Self {
        let mirror = match mirror {
            Ok(()) => MirrorOutcome::Applied,
            Err(err) => MirrorOutcome::Failed(err),
        };
        Self { primary, mirror }
    }

    fn skipped(primary: T) -> Self {
        Self {
            primary,
            mirror: MirrorOutcome::Skipped,
        }
    }

    /// Log a failed mirror under its own target and hand back the primary result.
    pub fn report(self, op: &'static str, id: i64) -> T {
        if let MirrorOutcome::Failed(err) = &self.mirror {
            counter!("songbook_cache_mirror_failure_total", "op" => op).increment(1);
            warn!(
                target = "songbook::cache::mirror",
                op,
                id,
                error = %err,
                "cache mirror failed; store write kept"
            );
        }
        self.primary
    }
}

/// Which tier answered a verse read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerseSource {
    Cache,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRead {
    pub verses: String,
    pub source: VerseSource,
}

#[derive(Clone)]
pub struct SongService {
    reader: Arc<dyn SongsRepo>,
    writer: Arc<dyn SongsWriteRepo>,
    cache: SongCache,
    info: Arc<dyn SongInfoProvider>,
}

impl SongService {
    pub fn new(
        reader: Arc<dyn SongsRepo>,
        writer: Arc<dyn SongsWriteRepo>,
        cache: SongCache,
        info: Arc<dyn SongInfoProvider>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            info,
        }
    }

    /// Look the song up upstream, persist it, then seed the cache under the assigned id.
    pub async fn add_song(
        &self,
        group_name: &str,
        song_name: &str,
    ) -> Result<MirroredWrite<i64>, SongServiceError> {
        let mut song = Song::new(group_name, song_name)?;

        let info = self
            .info
            .lookup(&song.group_name, &song.song_name)
            .await
            .map_err(SongServiceError::Upstream)?;
        song.text = info.text;
        song.release_date = info.release_date;
        song.link = info.link;

        let id = self
            .writer
            .add_song(&song)
            .await
            .map_err(SongServiceError::Store)?;
        song.id = id;

        let mirror = self.cache.set(&song).await;
        Ok(MirroredWrite::new(id, mirror))
    }

    pub async fn list_songs(
        &self,
        filter: &Song,
        page: PageRequest,
    ) -> Result<Vec<Song>, SongServiceError> {
        self.reader
            .get_songs(filter, page, &SongField::FILTER_ORDER)
            .await
            .map_err(SongServiceError::Store)
    }

    /// Apply the set fields of `patch` to song `patch.id` in both tiers.
    pub async fn update_song(&self, patch: &Song) -> Result<MirroredWrite<u64>, SongServiceError> {
        if patch.id < 1 {
            return Err(DomainError::validation("id must be a positive integer").into());
        }
        if !patch.has_changes() {
            return Err(DomainError::validation("no fields to update").into());
        }

        let affected = self
            .writer
            .update_song(patch, &SongField::UPDATE_ORDER)
            .await
            .map_err(SongServiceError::Store)?;
        if affected == 0 {
            debug!(
                target = "songbook::songs",
                id = patch.id,
                "update matched no rows"
            );
            return Ok(MirroredWrite::skipped(affected));
        }

        let mirror = self.cache.update(patch).await;
        Ok(MirroredWrite::new(affected, mirror))
    }

    /// Delete from the store; the cache is only touched once the row is gone.
    pub async fn delete_song(&self, id: i64) -> Result<MirroredWrite<()>, SongServiceError> {
        match self.writer.delete_song(id).await {
            Ok(()) => {}
            Err(RepoError::NoRowsAffected) => return Err(SongServiceError::NotFoundOnDelete { id }),
            Err(err) => return Err(SongServiceError::Store(err)),
        }

        let mirror = self.cache.del(id).await;
        Ok(MirroredWrite::new((), mirror))
    }

    pub async fn health(&self) -> Result<(), RepoError> {
        self.reader.health_check().await
    }

    pub async fn verses(
        &self,
        id: i64,
        verse: u32,
        limit: u32,
    ) -> Result<VerseRead, SongServiceError> {
        if verse < 1 || limit < 1 {
            return Err(DomainError::validation("verse and limit must be at least 1").into());
        }

        match self.cache.get_verses(id, verse, limit).await {
            Ok(verses) => {
                return Ok(VerseRead {
                    verses,
                    source: VerseSource::Cache,
                });
            }
            Err(err) if err.is_miss() => {}
            Err(err) => {
                warn!(
                    target = "songbook::cache",
                    id,
                    error = %err,
                    "cache verse lookup failed; reading from store"
                );
            }
        }

        counter!("songbook_store_fallback_total").increment(1);
        match self.reader.get_verses(id, verse, limit).await {
            Ok(verses) => Ok(VerseRead {
                verses,
                source: VerseSource::Store,
            }),
            Err(RepoError::NotFound) => Err(SongServiceError::NotFound { id }),
            Err(err) => Err(SongServiceError::Store(err)),
        }
    }
}
