//! Development stand-in for the upstream song-info service.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use utoipa::{IntoParams, OpenApi};
use songbook_api_types::SongInfoResponse;

use crate::application::error::ErrorReport;
use crate::application::info::{InfoError, SongInfoProvider};

use super::api::docs::DOC_PATH;
use super::middleware::{log_responses, set_request_context};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
struct InfoQuery {
    #[serde(default)]
    group_name: String,
    #[serde(default)]
    song_name: String,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "song-info stub",
        description = "Synthetic song details for local development."
    ),
    paths(song_info),
    components(schemas(SongInfoResponse))
)]
pub struct SongInfoApiDoc;

pub fn build_info_router(provider: Arc<dyn SongInfoProvider>) -> Router {
    Router::new()
        .route("/info", get(song_info))
        .route(DOC_PATH, get(info_openapi_json))
        .with_state(provider)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn info_openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(SongInfoApiDoc::openapi())
}

/// Look up song details
#[utoipa::path(
    get,
    path = "/info",
    params(InfoQuery),
    responses(
        (status = 200, description = "Song details", body = SongInfoResponse),
        (status = 400, description = "Missing group or song name", body = SongInfoResponse),
        (status = 500, description = "Lookup failed", body = SongInfoResponse),
    )
)]
async fn song_info(
    State(provider): State<Arc<dyn SongInfoProvider>>,
    Query(query): Query<InfoQuery>,
) -> Response {
    match provider.lookup(&query.group_name, &query.song_name).await {
        Ok(info) => {
            let body = SongInfoResponse {
                text: info.text,
                release_date: info.release_date.map(|date| date.midnight().assume_utc()),
                link: info.link,
                error: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            let status = match &err {
                InfoError::Rejected { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let message = match &err {
                InfoError::Rejected { message, .. } => message.clone(),
                other => other.to_string(),
            };
            let mut response = (status, Json(SongInfoResponse::failure(message))).into_response();
            ErrorReport::from_error("infra::http::info_stub", status, &err).attach(&mut response);
            response
        }
    }
}
