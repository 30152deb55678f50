//! Song API handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use songbook_api_types::iso_date;
use time::Date;
use url::Url;

use crate::application::error::ErrorReport;
use crate::application::info::InfoError;
use crate::application::repos::{PageRequest, RepoError};
use crate::application::songs::SongServiceError;
use crate::domain::error::DomainError;
use crate::domain::songs::Song;

use super::error::{ApiError, ApiErrorBody, codes};
use super::models::*;
use super::state::ApiState;

/// List songs
#[utoipa::path(
    get,
    path = "/songs",
    tag = "songs",
    params(SongListQuery),
    responses(
        (status = 200, description = "Matching songs ordered by id", body = SongListResponse),
        (status = 400, description = "Invalid filter or paging", body = ApiErrorBody),
        (status = 500, description = "Store failure", body = ApiErrorBody),
    )
)]
pub async fn list_songs(
    State(state): State<ApiState>,
    query: Result<Query<SongListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(query_rejection)?;

    let page = query.page.unwrap_or(DEFAULT_PAGE);
    if page < 1 {
        return Err(ApiError::bad_request("page must be at least 1", None));
    }
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if limit < 1 {
        return Err(ApiError::bad_request("limit must be at least 1", None));
    }

    let filter = Song {
        id: query.id.unwrap_or(0),
        group_name: query.group_name.unwrap_or_default(),
        song_name: query.song_name.unwrap_or_default(),
        text: query.song_text.unwrap_or_default(),
        release_date: parse_release_date(query.release_date.as_deref())?,
        link: query.link.unwrap_or_default(),
    };

    let songs = state
        .songs
        .list_songs(&filter, PageRequest::new(page, limit.min(MAX_PAGE_LIMIT)))
        .await
        .map_err(song_error_to_api)?;

    Ok(Json(SongListResponse {
        songs: songs.into_iter().map(song_view).collect(),
    }))
}

/// Add a song, enriched by the song-info service
#[utoipa::path(
    post,
    path = "/songs",
    tag = "songs",
    request_body = AddSongRequest,
    responses(
        (status = 201, description = "Song stored", body = AddSongResponse),
        (status = 400, description = "Missing group or song name", body = ApiErrorBody),
        (status = 502, description = "Song-info service rejected the lookup", body = ApiErrorBody),
        (status = 500, description = "Store or song-info failure", body = ApiErrorBody),
    )
)]
pub async fn add_song(
    State(state): State<ApiState>,
    payload: Result<Json<AddSongRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection)?;

    let outcome = state
        .songs
        .add_song(&payload.group_name, &payload.song_name)
        .await
        .map_err(song_error_to_api)?;
    let assigned = outcome.primary;
    let id = outcome.report("add_song", assigned);

    Ok((StatusCode::CREATED, Json(AddSongResponse { id })))
}

/// Partially update a song
#[utoipa::path(
    put,
    path = "/songs",
    tag = "songs",
    request_body = UpdateSongRequest,
    responses(
        (status = 204, description = "Update applied"),
        (status = 400, description = "Invalid patch", body = ApiErrorBody),
        (status = 500, description = "Store failure", body = ApiErrorBody),
    )
)]
pub async fn update_song(
    State(state): State<ApiState>,
    payload: Result<Json<UpdateSongRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection)?;

    if let Some(link) = payload.link.as_deref().filter(|link| !link.is_empty()) {
        Url::parse(link).map_err(|err| {
            ApiError::bad_request("link must be a valid url", Some(err.to_string()))
        })?;
    }

    let patch = Song {
        id: payload.id,
        group_name: payload.group_name.unwrap_or_default(),
        song_name: payload.song_name.unwrap_or_default(),
        text: payload.text.unwrap_or_default(),
        release_date: parse_release_date(payload.release_date.as_deref())?,
        link: payload.link.unwrap_or_default(),
    };

    let outcome = state
        .songs
        .update_song(&patch)
        .await
        .map_err(song_error_to_api)?;
    outcome.report("update_song", patch.id);

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a song
#[utoipa::path(
    delete,
    path = "/songs/{id}",
    tag = "songs",
    params(("id" = i64, Path, description = "Song id")),
    responses(
        (status = 204, description = "Song deleted"),
        (status = 400, description = "Id is not an integer", body = ApiErrorBody),
        (status = 404, description = "No such song", body = ApiErrorBody),
        (status = 500, description = "Store failure", body = ApiErrorBody),
    )
)]
pub async fn delete_song(
    State(state): State<ApiState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id.map_err(|rejection| {
        ApiError::bad_request("id must be an integer", Some(rejection.body_text()))
    })?;

    let outcome = state
        .songs
        .delete_song(id)
        .await
        .map_err(song_error_to_api)?;
    outcome.report("delete_song", id);

    Ok(StatusCode::NO_CONTENT)
}

/// Page through a song's verses
#[utoipa::path(
    get,
    path = "/verses",
    tag = "songs",
    params(VersesQuery),
    responses(
        (status = 200, description = "Requested verses", body = VersesResponse),
        (status = 400, description = "Missing id", body = ApiErrorBody),
        (status = 404, description = "No such song", body = ApiErrorBody),
        (status = 500, description = "Store failure", body = ApiErrorBody),
    )
)]
pub async fn get_verses(
    State(state): State<ApiState>,
    query: Result<Query<VersesQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(query_rejection)?;

    let id = query
        .id
        .ok_or_else(|| ApiError::bad_request("id is required", None))?;
    let verse = query.verse.unwrap_or(DEFAULT_VERSE);
    let limit = query.limit.unwrap_or(DEFAULT_VERSE_LIMIT);

    let read = state
        .songs
        .verses(id, verse, limit)
        .await
        .map_err(song_error_to_api)?;

    Ok(Json(VersesResponse {
        verses: read.verses,
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "ops",
    responses(
        (status = 204, description = "Store reachable"),
        (status = 503, description = "Store unreachable"),
    )
)]
pub async fn health(State(state): State<ApiState>) -> Response {
    match state.songs.health().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

fn parse_release_date(raw: Option<&str>) -> Result<Option<Date>, ApiError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => iso_date::parse(value).map(Some).map_err(|err| {
            ApiError::bad_request(
                "release_date must use YYYY-MM-DD",
                Some(format!("`{value}`: {err}")),
            )
        }),
    }
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::bad_request("invalid query parameters", Some(rejection.body_text()))
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("invalid request body", Some(rejection.body_text()))
}

pub(crate) fn song_error_to_api(err: SongServiceError) -> ApiError {
    match &err {
        SongServiceError::Validation(DomainError::Validation { message }) => {
            ApiError::bad_request("invalid request", Some(message.clone()))
        }
        SongServiceError::NotFoundOnDelete { .. } | SongServiceError::NotFound { .. } => {
            ApiError::not_found("song not found")
        }
        SongServiceError::Upstream(InfoError::Rejected { status, message }) => ApiError::new(
            StatusCode::BAD_GATEWAY,
            codes::UPSTREAM_REJECTED,
            "song info service rejected the lookup",
            Some(format!("{status}: {message}")),
        )
        .with_source(&err),
        SongServiceError::Upstream(_) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::UPSTREAM,
            "song info service unavailable",
            None,
        )
        .with_source(&err),
        SongServiceError::Store(RepoError::Timeout) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::DB_TIMEOUT,
            "database timeout",
            None,
        )
        .with_source(&err),
        SongServiceError::Store(_) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "persistence error",
            None,
        )
        .with_source(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_rejection_maps_to_bad_gateway() {
        let err = song_error_to_api(SongServiceError::Upstream(InfoError::Rejected {
            status: 404,
            message: "unknown song".into(),
        }));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), codes::UPSTREAM_REJECTED);
    }

    #[test]
    fn unreachable_upstream_is_internal() {
        let err = song_error_to_api(SongServiceError::Upstream(InfoError::Unreachable(
            "connection refused".into(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_row_on_delete_is_not_found() {
        let err = song_error_to_api(SongServiceError::NotFoundOnDelete { id: 3 });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rejected_store_input_is_a_store_failure() {
        let err = song_error_to_api(SongServiceError::Store(RepoError::InvalidInput {
            message: "invalid input syntax for type date".into(),
        }));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), codes::REPO);
    }

    #[test]
    fn release_date_must_be_calendar_day() {
        assert!(parse_release_date(Some("2020-13-01")).is_err());
        assert!(parse_release_date(Some("yesterday")).is_err());
        assert_eq!(parse_release_date(Some("  ")).expect("blank"), None);
        assert!(parse_release_date(Some("2020-02-29")).expect("leap").is_some());
    }
}
