pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get},
};

use crate::infra::http::middleware::{log_responses, set_request_context};

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/songs",
            get(handlers::list_songs)
                .post(handlers::add_song)
                .put(handlers::update_song),
        )
        .route("/songs/{id}", delete(handlers::delete_song))
        .route("/verses", get(handlers::get_verses))
        .route("/health", get(handlers::health))
        .route(docs::DOC_PATH, get(docs::openapi_json))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
