use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use chart_backend::{
    AppState,
    auth::AuthService,
    cache::{ChartCache, RedisCache},
    charts::DeezerClient,
    config::Config,
    create_router,
    database::PgUserStore,
    utils::{PasswordHasher, TokenService},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    let tokens = TokenService::new(&config.jwt_secret).expect("Invalid JWT secret");

    let users = PgUserStore::connect(&config.database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to Postgres");
    users
        .ensure_schema()
        .await
        .expect("Failed to prepare users table");
    tracing::info!("Connected to Postgres");

    let cache = RedisCache::connect(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    let chart_source = DeezerClient::new(config.chart_api_url.clone(), config.upstream_timeout())
        .expect("Failed to build HTTP client");

    let users = Arc::new(users);
    let state = AppState::new(
        AuthService::new(
            users.clone(),
            PasswordHasher::default(),
            tokens,
            config.jwt_expiration(),
        ),
        ChartCache::new(
            Arc::new(cache),
            Arc::new(chart_source),
            config.chart_cache_ttl(),
        ),
    );

    let app = create_router(state);

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    users.close().await;
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
