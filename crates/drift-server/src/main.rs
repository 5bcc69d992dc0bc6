mod cleanup;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use drift_api::{AppState, AppStateInner, files, messages, rooms, sweep};
use drift_relay::{RoomHub, connection};

#[derive(Clone)]
struct RelayState {
    hub: RoomHub,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drift=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("DRIFT_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("DRIFT_PORT")
        .unwrap_or_else(|_| "3400".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("DRIFT_DB_PATH")
        .unwrap_or_else(|_| "drift.db".into())
        .into();
    let sweep_interval_secs: u64 = std::env::var("DRIFT_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300);

    // Init database and relay hub (relay state is in-memory only: it starts
    // empty and clients resynchronize on reconnect)
    let db = Arc::new(drift_db::Database::open(&db_path)?);
    let hub = RoomHub::new();

    // Background expiry sweep, independent of any user action
    tokio::spawn(cleanup::run_sweep_loop(db.clone(), sweep_interval_secs));

    let app_state: AppState = Arc::new(AppStateInner { db });

    let api_routes = Router::new()
        .route("/api/rooms", post(rooms::create_room))
        .route("/api/rooms/{id}", get(rooms::get_room))
        .route(
            "/api/rooms/{id}/validate-password",
            post(rooms::validate_password),
        )
        .route("/api/files", post(files::create_file))
        .route("/api/rooms/{id}/files", get(files::list_files))
        .route("/api/files/{id}", get(files::get_file))
        .route("/api/messages", post(messages::create_message))
        .route("/api/rooms/{id}/messages", get(messages::list_messages))
        .route("/api/cleanup", post(sweep::trigger_sweep))
        .with_state(app_state);

    let ws_route = Router::new()
        .route("/ws", get(ws_upgrade))
        .with_state(RelayState { hub });

    let app = Router::new()
        .merge(api_routes)
        .merge(ws_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("drift server listening on {}", addr);
    info!("sweep interval: {}s", sweep_interval_secs);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<RelayState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_socket(socket, state.hub))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
