//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::songs::{Song, SongField};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("no rows affected")]
    NoRowsAffected,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// One page of a filtered listing. Both values are 1-based and already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

#[async_trait]
pub trait SongsRepo: Send + Sync {
    /// Every stored song; used to seed the cache.
    async fn get_all_songs(&self) -> Result<Vec<Song>, RepoError>;

    /// Songs matching the set fields of `filter` among `fields`, ordered by id.
    async fn get_songs(
        &self,
        filter: &Song,
        page: PageRequest,
        fields: &[SongField],
    ) -> Result<Vec<Song>, RepoError>;

    async fn get_verses(&self, id: i64, verse: u32, limit: u32) -> Result<String, RepoError>;

    /// Liveness check for the backing store.
    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
pub trait SongsWriteRepo: Send + Sync {
    /// Persist `song` and return the assigned id.
    async fn add_song(&self, song: &Song) -> Result<i64, RepoError>;

    /// Apply the set fields of `song` among `fields` to row `song.id`; returns rows affected.
    async fn update_song(&self, song: &Song, fields: &[SongField]) -> Result<u64, RepoError>;

    /// Fails with [`RepoError::NoRowsAffected`] when `id` does not exist.
    async fn delete_song(&self, id: i64) -> Result<(), RepoError>;
}
