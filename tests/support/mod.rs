#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use songbook::application::info::{InfoError, SongInfo, SongInfoProvider};
use songbook::application::repos::{PageRequest, RepoError, SongsRepo, SongsWriteRepo};
use songbook::application::songs::SongService;
use songbook::cache::{CacheError, HashBackend, HashFields, MemoryHashBackend, SongCache};
use songbook::domain::songs::{Song, SongField};
use songbook::domain::verses::paginate_verses;
use time::macros::date;
use tokio::sync::Mutex;

pub const LYRICS: &str = "first verse\n\nsecond verse\n\nthird verse";

/// Relational store stand-in keyed by id.
#[derive(Default)]
pub struct MemorySongs {
    songs: Mutex<BTreeMap<i64, Song>>,
    next_id: AtomicI64,
}

impl MemorySongs {
    pub async fn insert(&self, mut song: Song) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        song.id = id;
        self.songs.lock().await.insert(id, song);
        id
    }

    pub async fn get(&self, id: i64) -> Option<Song> {
        self.songs.lock().await.get(&id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.songs.lock().await.len()
    }
}

fn matches(song: &Song, filter: &Song, fields: &[SongField]) -> bool {
    fields.iter().all(|field| match field.value(filter) {
        Some(wanted) => field.value(song) == Some(wanted),
        None => true,
    })
}

#[async_trait]
impl SongsRepo for MemorySongs {
    async fn get_all_songs(&self) -> Result<Vec<Song>, RepoError> {
        Ok(self.songs.lock().await.values().cloned().collect())
    }

    async fn get_songs(
        &self,
        filter: &Song,
        page: PageRequest,
        fields: &[SongField],
    ) -> Result<Vec<Song>, RepoError> {
        let songs = self.songs.lock().await;
        Ok(songs
            .values()
            .filter(|song| matches(song, filter, fields))
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_verses(&self, id: i64, verse: u32, limit: u32) -> Result<String, RepoError> {
        let songs = self.songs.lock().await;
        let song = songs.get(&id).ok_or(RepoError::NotFound)?;
        Ok(paginate_verses(&song.text, verse as usize, limit as usize))
    }
}

#[async_trait]
impl SongsWriteRepo for MemorySongs {
    async fn add_song(&self, song: &Song) -> Result<i64, RepoError> {
        Ok(self.insert(song.clone()).await)
    }

    async fn update_song(&self, patch: &Song, fields: &[SongField]) -> Result<u64, RepoError> {
        let mut songs = self.songs.lock().await;
        let Some(song) = songs.get_mut(&patch.id) else {
            return Ok(0);
        };
        for field in fields {
            if field.value(patch).is_none() {
                continue;
            }
            match field {
                SongField::GroupName => song.group_name = patch.group_name.clone(),
                SongField::SongName => song.song_name = patch.song_name.clone(),
                SongField::ReleaseDate => song.release_date = patch.release_date,
                SongField::Link => song.link = patch.link.clone(),
                SongField::Text => song.text = patch.text.clone(),
                SongField::Id => {}
            }
        }
        Ok(1)
    }

    async fn delete_song(&self, id: i64) -> Result<(), RepoError> {
        match self.songs.lock().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NoRowsAffected),
        }
    }
}

/// Upstream stand-in returning fixed details, or a fixed rejection.
pub struct FakeInfo {
    reject_with: Option<u16>,
    calls: AtomicUsize,
}

impl FakeInfo {
    pub fn answering() -> Self {
        Self {
            reject_with: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SongInfoProvider for FakeInfo {
    async fn lookup(&self, group_name: &str, song_name: &str) -> Result<SongInfo, InfoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.reject_with {
            return Err(InfoError::Rejected {
                status,
                message: "unknown song".to_string(),
            });
        }
        Ok(SongInfo {
            text: LYRICS.to_string(),
            release_date: Some(date!(2006 - 07 - 16)),
            link: format!("https://songs.example/{group_name}/{song_name}"),
        })
    }
}

/// Cache backend whose every call fails.
#[derive(Default)]
pub struct BrokenBackend;

#[async_trait]
impl HashBackend for BrokenBackend {
    async fn replace(&self, _key: &str, _fields: &HashFields) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn merge(&self, _key: &str, _fields: &HashFields) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn field(&self, _key: &str, _field: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn fields(&self, _key: &str) -> Result<HashMap<String, String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }
}

/// Cache backend whose calls never complete.
pub struct HangingBackend;

#[async_trait]
impl HashBackend for HangingBackend {
    async fn replace(&self, _key: &str, _fields: &HashFields) -> Result<(), CacheError> {
        std::future::pending().await
    }

    async fn merge(&self, _key: &str, _fields: &HashFields) -> Result<(), CacheError> {
        std::future::pending().await
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        std::future::pending().await
    }

    async fn field(&self, _key: &str, _field: &str) -> Result<Option<String>, CacheError> {
        std::future::pending().await
    }

    async fn fields(&self, _key: &str) -> Result<HashMap<String, String>, CacheError> {
        std::future::pending().await
    }
}

pub struct Harness {
    pub store: Arc<MemorySongs>,
    pub backend: Arc<MemoryHashBackend>,
    pub cache: SongCache,
    pub info: Arc<FakeInfo>,
    pub service: Arc<SongService>,
}

pub fn harness_with(info: FakeInfo) -> Harness {
    let store = Arc::new(MemorySongs::default());
    let backend = Arc::new(MemoryHashBackend::new());
    let cache = SongCache::new(backend.clone(), Duration::from_millis(200));
    let info = Arc::new(info);
    let service = Arc::new(SongService::new(
        store.clone(),
        store.clone(),
        cache.clone(),
        info.clone(),
    ));
    Harness {
        store,
        backend,
        cache,
        info,
        service,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeInfo::answering())
}

pub fn broken_cache_service(store: Arc<MemorySongs>) -> SongService {
    let cache = SongCache::new(Arc::new(BrokenBackend), Duration::from_millis(200));
    SongService::new(
        store.clone(),
        store,
        cache,
        Arc::new(FakeInfo::answering()),
    )
}

pub fn hanging_cache_service(store: Arc<MemorySongs>, timeout: Duration) -> SongService {
    SongService::new(
        store.clone(),
        store,
        SongCache::new(Arc::new(HangingBackend), timeout),
        Arc::new(FakeInfo::answering()),
    )
}

pub fn song(group: &str, title: &str) -> Song {
    Song {
        group_name: group.to_string(),
        song_name: title.to_string(),
        text: LYRICS.to_string(),
        release_date: Some(date!(2006 - 07 - 16)),
        link: format!("https://songs.example/{group}/{title}"),
        ..Song::default()
    }
}
