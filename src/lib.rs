use std::sync::Arc;

use auth::AuthService;
use cache::ChartCache;

pub mod auth;
pub mod cache;
pub mod charts;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod utils;

pub use router::create_router;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub charts: Arc<ChartCache>,
}

impl AppState {
    pub fn new(auth: AuthService, charts: ChartCache) -> Self {
        Self {
            auth: Arc::new(auth),
            charts: Arc::new(charts),
        }
    }
}
