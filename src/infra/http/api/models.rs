use serde::Deserialize;
use utoipa::IntoParams;
use songbook_api_types::SongView;

use crate::domain::songs::Song;

pub use songbook_api_types::{
    AddSongRequest, AddSongResponse, SongListResponse, UpdateSongRequest, VersesResponse,
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_VERSE: u32 = 1;
pub const DEFAULT_VERSE_LIMIT: u32 = 1;

/// Filters combine with AND; unset or empty ones are ignored.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SongListQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size, capped at 100.
    pub limit: Option<u32>,
    pub id: Option<i64>,
    /// `YYYY-MM-DD`.
    pub release_date: Option<String>,
    pub group_name: Option<String>,
    pub song_name: Option<String>,
    pub song_text: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VersesQuery {
    /// Song id; required.
    pub id: Option<i64>,
    /// 1-based first verse.
    pub verse: Option<u32>,
    /// Number of verses to return.
    pub limit: Option<u32>,
}

pub fn song_view(song: Song) -> SongView {
    SongView {
        id: song.id,
        group_name: song.group_name,
        song_name: song.song_name,
        text: song.text,
        release_date: song.release_date,
        link: song.link,
    }
}
