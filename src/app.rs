use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// `max_upload_bytes` replaces axum's 2 MB default body limit. The limit is
/// enforced while the multipart body is read, after authorization, so an
/// oversized upload still gets the JSON error envelope.
pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    crate::routes::configure_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}
