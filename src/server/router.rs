use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::server::{handlers, AppState};

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/names", get(handlers::names))
        .route("/api/submit", post(handlers::submit))
        .route("/api/health", get(handlers::health))
}

pub fn init(state: AppState, config: &ServerConfig) -> Router {
    let mut app = api_router();

    match config.public_dir.as_ref() {
        Some(dir) if dir.is_dir() => {
            info!("Serving static files from {}", dir.display());
            let index = ServeFile::new(dir.join("index.html"));
            app = app
                .route_service("/", index)
                .fallback_service(ServeDir::new(dir));
        }
        Some(dir) => warn!("Public directory {} not found; serving the API only", dir.display()),
        None => {}
    }

    if config.cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}
