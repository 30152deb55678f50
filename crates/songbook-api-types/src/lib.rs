//! Request and response payloads shared by the songbook server, its tests and the song-info stub.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// Calendar dates travel as `YYYY-MM-DD`.
pub mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    pub const FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

    pub fn parse(value: &str) -> Result<Date, time::error::Parse> {
        Date::parse(value, FORMAT)
    }

    pub fn format(date: Date) -> Result<String, time::error::Format> {
        date.format(FORMAT)
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let rendered = format(*date).map_err(S::Error::custom)?;
        serializer.serialize_str(&rendered)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => super::parse(value)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
            }
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongView {
    pub id: i64,
    pub group_name: String,
    pub song_name: String,
    pub text: String,
    #[serde(with = "iso_date::option", default)]
    pub release_date: Option<Date>,
    pub link: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongListResponse {
    pub songs: Vec<SongView>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSongRequest {
    pub group_name: String,
    pub song_name: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSongResponse {
    pub id: i64,
}

/// Partial update; absent or empty fields are left untouched.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSongRequest {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// `YYYY-MM-DD`; validated by the server so the error can name the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersesResponse {
    pub verses: String,
}

/// Body returned by the upstream song-info service for `GET /info`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongInfoResponse {
    #[serde(default)]
    pub text: String,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub release_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SongInfoResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            release_date: None,
            link: String::new(),
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn song_view_renders_release_date_as_calendar_day() {
        let view = SongView {
            id: 7,
            group_name: "Muse".into(),
            song_name: "Uprising".into(),
            text: "v1".into(),
            release_date: Some(date!(2009 - 09 - 07)),
            link: String::new(),
        };

        let json = serde_json::to_value(&view).expect("serialize");
        assert_eq!(json["release_date"], "2009-09-07");
    }

    #[test]
    fn empty_release_date_deserializes_as_none() {
        let view: SongView = serde_json::from_str(
            r#"{"id":1,"group_name":"a","song_name":"b","text":"","release_date":"","link":""}"#,
        )
        .expect("deserialize");
        assert_eq!(view.release_date, None);
    }

    #[test]
    fn info_response_accepts_rfc3339_timestamps() {
        let info: SongInfoResponse = serde_json::from_str(
            r#"{"text":"v1","release_date":"2024-05-01T00:00:00Z","link":"https://x"}"#,
        )
        .expect("deserialize");
        assert_eq!(info.release_date, Some(datetime!(2024-05-01 0:00 UTC)));
        assert!(info.error.is_none());
    }
}
