use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use kulturrevolution_server::config::ServerConfig;
use kulturrevolution_server::constants::{OUTBOUND_QUEUE_CAPACITY, PLAYER_NOT_FOUND_TEXT};
use kulturrevolution_server::fanout::OutboundMessage;
use kulturrevolution_server::session::GameSession;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Clone)]
struct AppState {
    session: SharedSession,
    static_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct JoinRequest {
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = ServerConfig::parse();

    let state = AppState {
        session: Arc::new(Mutex::new(GameSession::new(config.session_options()))),
        static_dir: config.static_dir.clone(),
    };
    if !config.static_dir.is_dir() {
        log::warn!(
            "static dir {} not found; pages will 404",
            config.static_dir.display()
        );
    }

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/join", post(join_handler))
        .route("/role/{id}", get(role_handler))
        .route("/ws", get(ws_handler))
        .route_service("/join", ServeFile::new(config.static_dir.join("join.html")))
        .route_service("/admin", ServeFile::new(config.static_dir.join("admin.html")))
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    log::info!("game server running in {:?} mode", config.mode);
    log::info!("local: http://localhost:{}", config.port);
    log::info!("join page: http://{bind_addr}/join");
    log::info!("admin panel: http://localhost:{}/admin", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn join_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let mut guard = state.session.lock().await;
    Json(join_response(&mut guard, &body))
}

fn requested_name(body: &[u8]) -> String {
    serde_json::from_slice::<JoinRequest>(body)
        .ok()
        .and_then(|request| request.name)
        .unwrap_or_default()
}

fn join_response(session: &mut GameSession, body: &[u8]) -> Value {
    match session.join(&requested_name(body)) {
        Ok(player_id) => json!({ "success": true, "playerID": player_id }),
        Err(error) => json!({ "success": false, "error": error.to_string() }),
    }
}

async fn role_handler(
    State(state): State<AppState>,
    UrlPath(player_id): UrlPath<String>,
) -> Response {
    let exists = state.session.lock().await.player(&player_id).is_some();
    if !exists {
        return (StatusCode::NOT_FOUND, PLAYER_NOT_FOUND_TEXT).into_response();
    }
    role_page(&state.static_dir, &player_id).await
}

async fn role_page(static_dir: &Path, player_id: &str) -> Response {
    let path = static_dir.join("role.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Html(body).into_response(),
        Err(error) => {
            log::warn!("failed to read {}: {error}", path.display());
            role_fallback(player_id).into_response()
        }
    }
}

fn role_fallback(player_id: &str) -> (StatusCode, String) {
    (StatusCode::OK, format!("Player {player_id} is registered"))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state.session, socket))
}

async fn handle_socket(session: SharedSession, socket: WebSocket) {
    let connection_id = format!(
        "conn_{}",
        NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
    );
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE_CAPACITY);
    session.lock().await.connect(&connection_id, tx);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            let should_close = matches!(outbound, OutboundMessage::Close { .. });
            let result = match outbound {
                OutboundMessage::Text(payload) => {
                    ws_sender.send(Message::Text(payload.into())).await
                }
                OutboundMessage::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    ws_sender.send(Message::Close(Some(frame))).await
                }
            };
            if result.is_err() || should_close {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                session.lock().await.handle_raw(&connection_id, raw.as_str());
            }
            Message::Binary(raw) => {
                if let Ok(text) = std::str::from_utf8(&raw) {
                    session.lock().await.handle_raw(&connection_id, text);
                } else {
                    log::debug!("ignoring non-utf8 frame from {connection_id}");
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    session.lock().await.disconnect(&connection_id);
    let _ = writer.await;
}
