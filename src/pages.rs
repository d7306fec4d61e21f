use std::path::Path;

use axum::{routing::get, Router};
use tower_http::services::{ServeDir, ServeFile};

use crate::state::AppState;

/// HTML pages, static assets and the health probe.
pub fn page_routes(static_dir: &Path) -> Router<AppState> {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .route_service("/login", ServeFile::new(static_dir.join("login.html")))
        .route_service("/signup", ServeFile::new(static_dir.join("signup.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/health", get(|| async { "ok" }))
}
