use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{AppState, middleware::log_errors, routes};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(routes::user::signup))
        .route("/login", post(routes::user::login))
        .route("/verify-token", post(routes::user::verify_token))
}

pub fn music_routes() -> Router<AppState> {
    Router::new().route("/api/music/nepalese", get(routes::music::nepalese_chart))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(music_routes())
        .layer(axum::middleware::from_fn(log_errors))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
