//! Upstream song-info lookup.
//!
//! The catalog asks an external service for lyrics, release date and link when a song is added.
//! [`SyntheticSongInfo`] fabricates those answers for local development; release dates come from
//! an injected [`Clock`] so tests can pin them.

use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, Duration, OffsetDateTime};

/// Details the upstream service knows about a `(group, title)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongInfo {
    pub text: String,
    pub release_date: Option<Date>,
    pub link: String,
}

#[derive(Debug, Error)]
pub enum InfoError {
    #[error("song info service unreachable: {0}")]
    Unreachable(String),
    #[error("song info service answered {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("song info response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SongInfoProvider: Send + Sync {
    async fn lookup(&self, group_name: &str, song_name: &str) -> Result<SongInfo, InfoError>;
}

pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// Hands out release dates walking one day further into the past per call.
pub struct ReleaseDateSequence {
    clock: Arc<dyn Clock>,
    issued: AtomicU32,
}

impl ReleaseDateSequence {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            issued: AtomicU32::new(0),
        }
    }

    pub fn next(&self) -> Date {
        let back = self.issued.fetch_add(1, Ordering::Relaxed);
        let today = self.clock.today();
        today
            .checked_sub(Duration::days(i64::from(back)))
            .unwrap_or(Date::MIN)
    }
}

pub const SYNTHETIC_LYRICS: &str = "verse1\n\nverse2\n\nverse3";
const SYNTHETIC_LINK_BASE: &str = "https://songs.ru";

pub struct SyntheticSongInfo {
    dates: ReleaseDateSequence,
}

impl SyntheticSongInfo {
    pub fn new(dates: ReleaseDateSequence) -> Self {
        Self { dates }
    }
}

#[async_trait]
impl SongInfoProvider for SyntheticSongInfo {
    async fn lookup(&self, group_name: &str, song_name: &str) -> Result<SongInfo, InfoError> {
        if group_name.is_empty() {
            return Err(InfoError::Rejected {
                status: 400,
                message: "group_name is required".to_string(),
            });
        }
        if song_name.is_empty() {
            return Err(InfoError::Rejected {
                status: 400,
                message: "song_name is required".to_string(),
            });
        }

        let link = format!(
            "{SYNTHETIC_LINK_BASE}/{}/{}",
            group_name.replace(' ', "_"),
            song_name.replace(' ', "_")
        );

        Ok(SongInfo {
            text: SYNTHETIC_LYRICS.to_string(),
            release_date: Some(self.dates.next()),
            link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    struct FixedClock(Date);

    impl Clock for FixedClock {
        fn today(&self) -> Date {
            self.0
        }
    }

    fn provider() -> SyntheticSongInfo {
        SyntheticSongInfo::new(ReleaseDateSequence::new(Arc::new(FixedClock(date!(
            2024 - 03 - 02
        )))))
    }

    #[tokio::test]
    async fn release_dates_step_back_one_day_per_lookup() {
        let provider = provider();

        let first = provider.lookup("Muse", "Uprising").await.expect("lookup");
        let second = provider.lookup("Muse", "Hysteria").await.expect("lookup");
        let third = provider.lookup("Muse", "Starlight").await.expect("lookup");

        assert_eq!(first.release_date, Some(date!(2024 - 03 - 02)));
        assert_eq!(second.release_date, Some(date!(2024 - 03 - 01)));
        assert_eq!(third.release_date, Some(date!(2024 - 02 - 29)));
    }

    #[tokio::test]
    async fn link_replaces_spaces_in_both_segments() {
        let info = provider()
            .lookup("Red Hot Chili Peppers", "Can't Stop")
            .await
            .expect("lookup");

        assert_eq!(info.link, "https://songs.ru/Red_Hot_Chili_Peppers/Can't_Stop");
        assert_eq!(info.text, SYNTHETIC_LYRICS);
    }

    #[tokio::test]
    async fn missing_names_are_rejected() {
        let err = provider().lookup("", "x").await.expect_err("rejected");
        assert!(matches!(err, InfoError::Rejected { status: 400, .. }));
    }
}
