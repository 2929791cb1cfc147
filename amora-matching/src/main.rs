use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod introductions;
mod matching;
mod models;
mod routes;
mod schema;
mod services;

use amora_shared::clients::db::{create_pool, DbPool};
use amora_shared::clients::rabbitmq::RabbitMQClient;
use amora_shared::clients::redis::RedisClient;
use config::AppConfig;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amora_shared::middleware::init_tracing("amora-matching");

    let config = AppConfig::load()?;
    let port = config.port;

    let metrics_handle = amora_shared::middleware::init_metrics();

    // Database pool
    let db = create_pool(&config.database_url);

    // Infrastructure clients
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;

    let state = Arc::new(AppState {
        db,
        config,
        rabbitmq,
        redis,
        metrics_handle,
    });

    let app = Router::new()
        // Health + metrics
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Discovery
        .route("/discover", get(routes::discover::discover))
        .route("/likes/received", get(routes::discover::likes_received))
        // Match actions + mutual matches
        .route(
            "/matches",
            post(routes::matches::record_action).get(routes::matches::list_matches),
        )
        // Blocks
        .route(
            "/blocks",
            post(routes::blocks::create_block).get(routes::blocks::list_blocks),
        )
        .route("/blocks/:user_id", delete(routes::blocks::remove_block))
        // Favorites
        .route("/favorites", get(routes::favorites::list_favorites))
        .route(
            "/favorites/:user_id",
            post(routes::favorites::add_favorite).delete(routes::favorites::remove_favorite),
        )
        // Matchmaker introductions
        .route(
            "/introductions",
            post(routes::introductions::create_introduction)
                .get(routes::introductions::list_introductions),
        )
        .route(
            "/introductions/:id",
            get(routes::introductions::get_introduction)
                .patch(routes::introductions::update_introduction),
        )
        .layer(axum::middleware::from_fn(
            amora_shared::middleware::metrics_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "amora-matching starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
