//! Song entity and the field descriptors shared by the SQL clause builder and the cache writer.
//!
//! A [`Song`] doubles as a sparse filter or patch: a field counts as "set" when it is non-zero,
//! non-empty or `Some`. Both storage tiers decide which columns to touch through
//! [`SongField::value`], so a partial update means the same thing in PostgreSQL and in the cache.

use songbook_api_types::iso_date;
use time::Date;

use super::error::DomainError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Song {
    pub id: i64,
    pub group_name: String,
    pub song_name: String,
    pub text: String,
    pub release_date: Option<Date>,
    pub link: String,
}

impl Song {
    /// A fresh, unpersisted song (`id == 0`).
    pub fn new(
        group_name: impl Into<String>,
        song_name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let group_name = group_name.into().trim().to_string();
        let song_name = song_name.into().trim().to_string();
        if group_name.is_empty() {
            return Err(DomainError::validation("group_name must not be empty"));
        }
        if song_name.is_empty() {
            return Err(DomainError::validation("song_name must not be empty"));
        }

        Ok(Self {
            group_name,
            song_name,
            ..Self::default()
        })
    }

    /// True when no field would constrain a query.
    pub fn is_empty(&self) -> bool {
        self.id == 0
            && self.group_name.is_empty()
            && self.song_name.is_empty()
            && self.text.is_empty()
            && self.link.is_empty()
            && self.release_date.is_none()
    }

    /// True when at least one field besides `id` is set.
    pub fn has_changes(&self) -> bool {
        SongField::UPDATE_ORDER
            .iter()
            .any(|field| field.value(self).is_some())
    }
}

/// A single bound value taken from a [`Song`] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    BigInt(i64),
    Text(String),
    Date(Date),
}

impl FieldValue {
    /// Rendering used for cache hash values.
    pub fn to_cache_string(&self) -> String {
        match self {
            FieldValue::BigInt(value) => value.to_string(),
            FieldValue::Text(value) => value.clone(),
            FieldValue::Date(date) => format_release_date(*date),
        }
    }
}

/// Render a release date as `YYYY-MM-DD`, the same rendering the HTTP API uses.
pub fn format_release_date(date: Date) -> String {
    // A calendar-only description cannot fail on a `Date`.
    iso_date::format(date).unwrap_or_else(|_| date.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SongField {
    Id,
    GroupName,
    SongName,
    ReleaseDate,
    Link,
    Text,
}

impl SongField {
    /// Predicate order for list filters.
    pub const FILTER_ORDER: [SongField; 6] = [
        SongField::Id,
        SongField::ReleaseDate,
        SongField::GroupName,
        SongField::SongName,
        SongField::Link,
        SongField::Text,
    ];

    /// Mutable fields in `SET` order. `Id` is never written.
    pub const UPDATE_ORDER: [SongField; 5] = [
        SongField::GroupName,
        SongField::SongName,
        SongField::ReleaseDate,
        SongField::Link,
        SongField::Text,
    ];

    /// Column name in the `songs` table, which is also the cache hash field name.
    pub const fn column(self) -> &'static str {
        match self {
            SongField::Id => "id",
            SongField::GroupName => "group_name",
            SongField::SongName => "song_name",
            SongField::ReleaseDate => "release_date",
            SongField::Link => "link",
            SongField::Text => "song_text",
        }
    }

    /// The field's value when it is set on `song`.
    pub fn value(self, song: &Song) -> Option<FieldValue> {
        match self {
            SongField::Id => (song.id != 0).then_some(FieldValue::BigInt(song.id)),
            SongField::GroupName => non_empty(&song.group_name),
            SongField::SongName => non_empty(&song.song_name),
            SongField::ReleaseDate => song.release_date.map(FieldValue::Date),
            SongField::Link => non_empty(&song.link),
            SongField::Text => non_empty(&song.text),
        }
    }
}

fn non_empty(value: &str) -> Option<FieldValue> {
    (!value.is_empty()).then(|| FieldValue::Text(value.to_string()))
}
