pub mod download;
pub mod health;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.output_dir);

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/upload-resume", post(upload::handle_upload_resume))
        .route(
            "/download-pdf/:filename",
            get(download::handle_download_pdf),
        )
        .nest_service("/static", static_files)
        // Oversized uploads must reach the handler so it can answer with its own 400.
        .layer(DefaultBodyLimit::max(upload::MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}
