use axum::routing::post;
use axum::Router;

use crate::state::AppState;

pub mod classifier;
pub mod error;
pub mod handler;
pub mod model;
pub mod naming;
pub mod repository;
pub mod service;
#[cfg(test)]
pub(crate) mod testing;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/videos/{id}/upload", post(handler::upload_video))
        .route("/videos/{id}/thumbnail", post(handler::upload_thumbnail))
}
