use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::debug;

use crate::domain::songs::{Song, SongField};
use crate::domain::verses::paginate_verses;

use super::backend::HashBackend;
use super::config::CacheConfig;
use super::error::CacheError;
use super::keys::{SONG_HASH_FIELDS, song_key};

/// Song-shaped operations over a [`HashBackend`]. Every call runs under its own deadline.
#[derive(Clone)]
pub struct SongCache {
    backend: Arc<dyn HashBackend>,
    timeout: Duration,
}

impl SongCache {
    pub fn new(backend: Arc<dyn HashBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn from_config(backend: Arc<dyn HashBackend>, config: &CacheConfig) -> Self {
        Self::new(backend, config.operation_timeout)
    }

    /// Overwrite the whole hash for `song.id` with all five fields.
    pub async fn set(&self, song: &Song) -> Result<(), CacheError> {
        let fields: Vec<(&'static str, String)> = SONG_HASH_FIELDS
            .iter()
            .map(|field| {
                let value = field
                    .value(song)
                    .map(|value| value.to_cache_string())
                    .unwrap_or_default();
                (field.column(), value)
            })
            .collect();

        self.bounded("set", self.backend.replace(&song_key(song.id), &fields))
            .await
    }

    /// Write only the fields set on `song`; everything else in the hash is kept.
    pub async fn update(&self, song: &Song) -> Result<(), CacheError> {
        let fields: Vec<(&'static str, String)> = SONG_HASH_FIELDS
            .iter()
            .filter_map(|field| {
                field
                    .value(song)
                    .map(|value| (field.column(), value.to_cache_string()))
            })
            .collect();
        if fields.is_empty() {
            return Ok(());
        }

        self.bounded("update", self.backend.merge(&song_key(song.id), &fields))
            .await
    }

    pub async fn del(&self, id: i64) -> Result<(), CacheError> {
        self.bounded("del", self.backend.remove(&song_key(id))).await
    }

    /// Paginated verses from the cached lyrics; an absent or empty text is a miss.
    pub async fn get_verses(&self, id: i64, verse: u32, limit: u32) -> Result<String, CacheError> {
        let text = self
            .bounded(
                "get_verses",
                self.backend
                    .field(&song_key(id), SongField::Text.column()),
            )
            .await?;

        match text {
            Some(text) if !text.is_empty() => {
                counter!("songbook_cache_hit_total").increment(1);
                Ok(paginate_verses(&text, verse as usize, limit as usize))
            }
            _ => {
                counter!("songbook_cache_miss_total").increment(1);
                debug!(target = "songbook::cache", id, "verse lookup missed the cache");
                Err(CacheError::Miss { id })
            }
        }
    }

    /// Raw hash for `id`; empty when nothing is cached.
    pub async fn fields(&self, id: i64) -> Result<HashMap<String, String>, CacheError> {
        self.bounded("fields", self.backend.fields(&song_key(id)))
            .await
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout {
                op,
                timeout_ms: self.timeout.as_millis(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryHashBackend;
    use time::macros::date;

    fn cache() -> (SongCache, Arc<MemoryHashBackend>) {
        let backend = Arc::new(MemoryHashBackend::new());
        let cache = SongCache::new(backend.clone(), Duration::from_millis(200));
        (cache, backend)
    }

    fn song() -> Song {
        Song {
            id: 3,
            group_name: "Muse".into(),
            song_name: "Uprising".into(),
            text: "v1\n\nv2\n\nv3".into(),
            release_date: Some(date!(2009 - 09 - 07)),
            link: "https://example.com/uprising".into(),
        }
    }

    #[tokio::test]
    async fn set_writes_every_field() {
        let (cache, _) = cache();
        cache.set(&song()).await.expect("set");

        let fields = cache.fields(3).await.expect("fields");
        assert_eq!(fields.len(), 5);
        assert_eq!(fields["group_name"], "Muse");
        assert_eq!(fields["release_date"], "2009-09-07");
        assert_eq!(fields["song_text"], "v1\n\nv2\n\nv3");
    }

    #[tokio::test]
    async fn set_overwrites_fields_cleared_on_the_song() {
        let (cache, _) = cache();
        cache.set(&song()).await.expect("set");

        let mut cleared = song();
        cleared.link.clear();
        cleared.release_date = None;
        cache.set(&cleared).await.expect("set");

        let fields = cache.fields(3).await.expect("fields");
        assert_eq!(fields["link"], "");
        assert_eq!(fields["release_date"], "");
    }

    #[tokio::test]
    async fn update_never_clears_absent_fields() {
        let (cache, _) = cache();
        cache.set(&song()).await.expect("set");

        let patch = Song {
            id: 3,
            song_name: "Hysteria".into(),
            ..Song::default()
        };
        cache.update(&patch).await.expect("update");

        let fields = cache.fields(3).await.expect("fields");
        assert_eq!(fields["song_name"], "Hysteria");
        assert_eq!(fields["group_name"], "Muse");
        assert_eq!(fields["link"], "https://example.com/uprising");
        assert_eq!(fields["song_text"], "v1\n\nv2\n\nv3");
    }

    #[tokio::test]
    async fn verses_come_from_cached_text() {
        let (cache, _) = cache();
        cache.set(&song()).await.expect("set");

        assert_eq!(cache.get_verses(3, 2, 1).await.expect("verses"), "v2");
    }

    #[tokio::test]
    async fn missing_or_empty_text_is_a_miss() {
        let (cache, _) = cache();
        let err = cache.get_verses(99, 1, 1).await.expect_err("miss");
        assert!(err.is_miss());

        let mut silent = song();
        silent.text.clear();
        cache.set(&silent).await.expect("set");
        let err = cache.get_verses(3, 1, 1).await.expect_err("miss");
        assert!(err.is_miss());
    }

    #[tokio::test]
    async fn del_removes_the_hash() {
        let (cache, backend) = cache();
        cache.set(&song()).await.expect("set");
        cache.del(3).await.expect("del");

        assert!(backend.is_empty());
    }
}
