//! OpenAPI document for the songbook API, served at [`DOC_PATH`].

use axum::Json;
use utoipa::OpenApi;

use super::error::{ApiErrorBody, ApiErrorMessage};
use super::handlers;
use super::models::{
    AddSongRequest, AddSongResponse, SongListResponse, UpdateSongRequest, VersesResponse,
};
use songbook_api_types::SongView;

pub const DOC_PATH: &str = "/swagger/doc.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "songbook",
        description = "Song catalog backed by PostgreSQL with a cached verse reader."
    ),
    paths(
        handlers::list_songs,
        handlers::add_song,
        handlers::update_song,
        handlers::delete_song,
        handlers::get_verses,
        handlers::health,
    ),
    components(schemas(
        SongView,
        SongListResponse,
        AddSongRequest,
        AddSongResponse,
        UpdateSongRequest,
        VersesResponse,
        ApiErrorBody,
        ApiErrorMessage,
    )),
    tags(
        (name = "songs", description = "Catalog and verse operations"),
        (name = "ops", description = "Liveness"),
    )
)]
pub struct SongbookApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(SongbookApiDoc::openapi())
}
