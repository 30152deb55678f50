//! Song cache.
//!
//! Each song is mirrored as a hash keyed by its decimal id with the fields
//! `group_name`, `song_name`, `release_date`, `link` and `song_text`. The
//! relational store stays authoritative; the cache may be rebuilt from it at
//! any time (see [`crate::infra::cache_warmer`]).
//!
//! ```toml
//! [cache]
//! url = "redis://127.0.0.1:6379"   # omit to keep the cache in process memory
//! operation_timeout_ms = 500
//! warm_on_startup = true
//! warm_concurrency = 8
//! ```

mod backend;
mod config;
mod error;
mod keys;
mod redis_backend;
mod store;

pub use backend::{HashBackend, HashFields, MemoryHashBackend};
pub use config::CacheConfig;
pub use error::CacheError;
pub use keys::{SONG_HASH_FIELDS, song_key};
pub use redis_backend::RedisHashBackend;
pub use store::SongCache;
