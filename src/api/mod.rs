pub mod extract;
pub mod songs;

pub use songs::{song_routes, AppState};

use crate::error::AppError;
use axum::{http::Uri, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", song_routes())
        .fallback(route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
