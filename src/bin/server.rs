use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use puckman_sim::constants::TICK_MS;
use puckman_sim::engine::{GameEngine, GameEngineOptions};
use puckman_sim::highscore_store::HighScoreStore;
use puckman_sim::server_utils::parse_highscore_limit;
use puckman_sim::types::Direction;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

#[derive(Clone)]
struct ClientContext {
    tx: mpsc::Sender<OutboundMessage>,
}

#[derive(Clone, Debug)]
enum OutboundMessage {
    Text(String),
    Close { code: u16, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

struct ServerState {
    clients: HashMap<String, ClientContext>,
    /// The one client whose commands reach the session. Everyone else watches.
    pilot_id: Option<String>,
    game: GameEngine,
    highscore_store: HighScoreStore,
    game_over_reported: bool,
    score_submitted: bool,
}

impl ServerState {
    fn new(highscore_store: HighScoreStore, seed: u32) -> Self {
        Self {
            clients: HashMap::new(),
            pilot_id: None,
            game: GameEngine::new(seed, GameEngineOptions::default()),
            highscore_store,
            game_over_reported: false,
            score_submitted: false,
        }
    }

    /// Registers a client and hands it the pilot seat if nobody holds it.
    fn add_client(&mut self, client_id: &str, context: ClientContext) -> bool {
        self.clients.insert(client_id.to_string(), context);
        if self.pilot_id.is_none() {
            self.pilot_id = Some(client_id.to_string());
        }
        self.is_pilot(client_id)
    }

    fn is_pilot(&self, client_id: &str) -> bool {
        self.pilot_id.as_deref() == Some(client_id)
    }
}

#[derive(Debug, Deserialize)]
struct HighScoreQuery {
    limit: Option<String>,
}

#[derive(Debug, PartialEq)]
enum ParsedClientMessage {
    Input { dir: Direction },
    Pause,
    NewGame,
    SubmitName { name: String },
    Ping { t: f64 },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let highscore_path = std::env::var("HIGHSCORE_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/highscores.json"));

    let seed = rand::random::<u32>();
    tracing::info!(seed, path = %highscore_path.display(), "starting session");
    let state = Arc::new(Mutex::new(ServerState::new(
        HighScoreStore::new(highscore_path),
        seed,
    )));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/highscores", get(highscore_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        tracing::info!(root = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        tracing::warn!("static file root not found, set STATIC_DIR to serve the renderer");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%bind_addr, %error, "failed to bind server socket");
            std::process::exit(1);
        }
    };

    tracing::info!(port, "listening");
    if let Err(error) = axum::serve(listener, app).await {
        tracing::error!(%error, "server runtime failed");
        std::process::exit(1);
    }
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("static"), PathBuf::from("dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn highscore_handler(
    State(state): State<SharedState>,
    Query(query): Query<HighScoreQuery>,
) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(
        guard
            .highscore_store
            .build_response(parse_highscore_limit(query.limit.as_deref())),
    )
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<OutboundMessage>(256);

    {
        let mut guard = state.lock().await;
        let pilot = guard.add_client(&client_id, ClientContext { tx: tx.clone() });
        let welcome = json!({
            "type": "welcome",
            "pilot": pilot,
            "world": guard.game.get_world_init(),
            "config": guard.game.config,
            "highScores": guard.highscore_store.table().entries(),
        });
        send_to_client(&mut guard, &client_id, &welcome, QueuePolicy::DisconnectOnFull);
    }
    tracing::info!(%client_id, "client connected");

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
                handle_client_message(state.clone(), &client_id, raw.as_str()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = std::str::from_utf8(&raw) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        remove_client(&mut guard, &client_id);
    }
    tracing::info!(%client_id, "client disconnected");
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: &str) {
    let Some(message) = parse_client_message(raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    let steers = !matches!(message, ParsedClientMessage::Ping { .. });
    if steers && !guard.is_pilot(client_id) {
        send_error(&mut guard, client_id, "only the pilot can steer the session");
        return;
    }
    match message {
        ParsedClientMessage::Input { dir } => {
            guard.game.set_desired_direction(dir);
        }
        ParsedClientMessage::Pause => {
            let paused = guard.game.toggle_pause();
            tracing::debug!(paused, "pause toggled");
        }
        ParsedClientMessage::NewGame => {
            guard.game.new_game();
            guard.game_over_reported = false;
            guard.score_submitted = false;
            tracing::info!(%client_id, "new game");
        }
        ParsedClientMessage::SubmitName { name } => {
            handle_submit_name(&mut guard, client_id, &name);
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(
                &mut guard,
                client_id,
                &json!({
                    "type": "pong",
                    "t": t,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
}

fn handle_submit_name(state: &mut ServerState, client_id: &str, name: &str) {
    let score = state.game.score();
    let rejection = if !state.game.is_ended() {
        Some("game is still running")
    } else if state.score_submitted {
        Some("score already submitted")
    } else if !state.highscore_store.qualifies(score) {
        Some("score does not qualify")
    } else {
        None
    };
    if let Some(reason) = rejection {
        send_error(state, client_id, reason);
        return;
    }

    match state.highscore_store.submit(name, score) {
        Ok(rank) => {
            state.score_submitted = true;
            tracing::info!(score, ?rank, "high score submitted");
            let entries = state.highscore_store.table().entries().to_vec();
            broadcast(
                state,
                &json!({
                    "type": "high_scores",
                    "entries": entries,
                }),
                QueuePolicy::DisconnectOnFull,
            );
        }
        Err(error) => {
            tracing::warn!(%error, "high score submission failed");
            send_error(state, client_id, &error.to_string());
        }
    }
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        loop {
            interval.tick().await;
            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    if state.game.is_ended() && state.game_over_reported {
        return;
    }

    state.game.step(TICK_MS);
    let snapshot = state.game.build_snapshot(true);
    broadcast(
        state,
        &json!({
            "type": "state",
            "snapshot": snapshot,
        }),
        QueuePolicy::DropOnFull,
    );

    if state.game.is_ended() && !state.game_over_reported {
        state.game_over_reported = true;
        let summary = state.game.build_summary();
        let qualifies = state.highscore_store.qualifies(summary.score);
        tracing::info!(score = summary.score, level = summary.level, qualifies, "game over");
        broadcast(
            state,
            &json!({
                "type": "game_over",
                "summary": summary,
                "qualifies": qualifies,
            }),
            QueuePolicy::DisconnectOnFull,
        );
    }
}

fn send_to_client(state: &mut ServerState, client_id: &str, message: &Value, policy: QueuePolicy) {
    let send_failed = if let Some(client) = state.clients.get(client_id) {
        client
            .tx
            .try_send(OutboundMessage::Text(message.to_string()))
            .is_err()
    } else {
        false
    };
    if send_failed && policy == QueuePolicy::DisconnectOnFull {
        disconnect_client(state, client_id);
    }
}

fn broadcast(state: &mut ServerState, message: &Value, policy: QueuePolicy) {
    let payload = message.to_string();
    let mut failed_clients = Vec::new();
    for (client_id, client) in &state.clients {
        if client
            .tx
            .try_send(OutboundMessage::Text(payload.clone()))
            .is_err()
            && policy == QueuePolicy::DisconnectOnFull
        {
            failed_clients.push(client_id.clone());
        }
    }
    for client_id in failed_clients {
        disconnect_client(state, &client_id);
    }
}

/// Drops a client and passes the pilot seat on if it held it.
fn remove_client(state: &mut ServerState, client_id: &str) -> Option<ClientContext> {
    let context = state.clients.remove(client_id)?;
    if state.is_pilot(client_id) {
        state.pilot_id = state.clients.keys().min().cloned();
        if let Some(next) = state.pilot_id.clone() {
            tracing::info!(client_id = %next, "pilot seat handed over");
            send_to_client(
                state,
                &next,
                &json!({ "type": "pilot" }),
                QueuePolicy::DisconnectOnFull,
            );
        }
    }
    Some(context)
}

fn disconnect_client(state: &mut ServerState, client_id: &str) {
    let Some(context) = remove_client(state, client_id) else {
        return;
    };
    tracing::warn!(%client_id, "outbound queue full, closing connection");
    let _ = context.tx.try_send(OutboundMessage::Close {
        code: 1013,
        reason: "slow consumer".to_string(),
    });
}

fn send_error(state: &mut ServerState, client_id: &str, message: &str) {
    send_to_client(
        state,
        client_id,
        &json!({
            "type": "error",
            "message": message,
        }),
        QueuePolicy::DisconnectOnFull,
    );
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let mut guard = state.lock().await;
    send_error(&mut guard, client_id, message);
}

fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "pause" => Some(ParsedClientMessage::Pause),
        "new_game" => Some(ParsedClientMessage::NewGame),
        "submit_name" => {
            let name = object.get("name")?.as_str()?.to_string();
            Some(ParsedClientMessage::SubmitName { name })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
