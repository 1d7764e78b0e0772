use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use farmpilot_api::auth::{self, AppState, AppStateInner};
use farmpilot_api::middleware::require_auth;
use farmpilot_api::storage::Storage;
use farmpilot_api::token::TokenConfig;
use farmpilot_api::{communities, demo, markets, status, users};
use farmpilot_relay::connection;
use farmpilot_relay::registry::VideoRelay;

#[derive(Clone)]
struct RelayState {
    relay: VideoRelay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farmpilot=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("FARMPILOT_DB_PATH").unwrap_or_else(|_| "farmpilot.db".into());
    let upload_dir = std::env::var("FARMPILOT_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into());
    let host = std::env::var("FARMPILOT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FARMPILOT_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;
    let tokens = TokenConfig::from_env()?;

    // Init database and upload storage
    let db = farmpilot_db::Database::open(&PathBuf::from(&db_path))?;
    let storage = Storage::new(PathBuf::from(&upload_dir)).await?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        tokens,
        storage,
        status: status::StatusCell::default(),
    });
    let relay = VideoRelay::new();

    // Routes
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/token", post(auth::issue_token))
        .route("/communities", get(communities::list_communities))
        .route("/communities/{community_id}", get(communities::get_community))
        .route("/communities/{community_id}/image", get(communities::get_image))
        .route("/markets", get(markets::list_markets))
        .route("/markets/{market_id}", get(markets::get_market))
        .route("/markets/{market_id}/image", get(markets::get_image))
        .route("/users/{id}/avatar", get(users::avatar_by_id))
        .route("/users/{id}/name", get(users::name_by_id))
        .route("/status/data", get(status::get_status).post(status::push_status))
        .route("/dummy/status/temp_hum", get(demo::temp_hum))
        .route("/dummy/status/water_level", get(demo::water_level))
        .route("/dummy/status/illumination", get(demo::illumination))
        .route("/dummy/status/tds", get(demo::tds))
        .route("/dummy/status/liquid_temp", get(demo::liquid_temp))
        .route("/dummy/status/prediction", get(demo::prediction))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/users/me", get(users::me))
        .route("/users/me/name", patch(users::update_name))
        .route("/users/me/avatar", get(users::my_avatar).patch(users::update_avatar))
        .route("/users/me/links", get(users::my_links))
        .route("/users/link", post(users::add_link))
        .route(
            "/users/link/{link_id}",
            patch(users::update_link).delete(users::delete_link),
        )
        .route("/communities", post(communities::create_community))
        .route(
            "/communities/{community_id}",
            patch(communities::update_community).delete(communities::delete_community),
        )
        .route("/communities/{community_id}/image", post(communities::upload_image))
        .route("/markets", post(markets::create_market))
        .route(
            "/markets/{market_id}",
            patch(markets::update_market).delete(markets::delete_market),
        )
        .route("/markets/{market_id}/image", post(markets::upload_image))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state.clone());

    let ws_routes = Router::new()
        .route("/ws/video_feed", get(producer_upgrade))
        .route("/ws/video", get(consumer_upgrade))
        .with_state(RelayState { relay });

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("farmpilot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({ "farmpilot": "DEV" }))
}

async fn producer_upgrade(
    State(state): State<RelayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_producer(socket, state.relay))
}

async fn consumer_upgrade(
    State(state): State<RelayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_consumer(socket, state.relay))
}
