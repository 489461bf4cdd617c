use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dino_ladder_server::constants::TICK_MS;
use dino_ladder_server::ladder::{generate_random_ladder, trace_paths};
use dino_ladder_server::rng::ThreadRandom;
use dino_ladder_server::roster::build_roster;
use dino_ladder_server::server_protocol::{parse_client_message, ParsedClientMessage};
use dino_ladder_server::server_utils::{
    default_dimensions, parse_dimension_query, resolve_dimensions,
};
use dino_ladder_server::session::GameSession;
use dino_ladder_server::types::LanePath;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Deserialize)]
struct LadderQuery {
    players: Option<String>,
    height: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/ladder", get(ladder_handler))
        .route("/ws", get(ws_handler));

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        info!(root = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        warn!("static file root not found, set STATIC_DIR to serve the front end");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            error!(%error, addr = %bind_addr, "failed to bind server socket");
            std::process::exit(1);
        }
    };

    info!(port, "listening");
    if let Err(error) = axum::serve(listener, app).await {
        error!(%error, "server runtime failed");
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

    let candidates = [PathBuf::from("dist"), PathBuf::from("web/dist")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn ladder_handler(Query(query): Query<LadderQuery>) -> Response {
    match build_ladder_response(query.players.as_deref(), query.height.as_deref()) {
        Ok(body) => Json(body).into_response(),
        Err(message) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": message })),
        )
            .into_response(),
    }
}

fn build_ladder_response(players: Option<&str>, height: Option<&str>) -> Result<Value, String> {
    let dims = parse_dimension_query(players, height)?;
    let ladder = generate_random_ladder(dims);
    let paths = trace_paths(dims, &ladder.rungs);
    let final_lanes: Vec<usize> = paths.iter().map(LanePath::final_lane).collect();
    Ok(json!({
        "dimensions": ladder.dimensions,
        "rungs": ladder.rungs,
        "origin": ladder.origin,
        "players": build_roster(dims.player_count),
        "paths": paths,
        "finalLanes": final_lanes,
    }))
}

async fn ws_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

async fn handle_socket(socket: WebSocket) {
    let connection_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    info!(connection_id, "client connected");

    let (tx, mut rx) = mpsc::channel::<String>(256);
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = GameSession::new(default_dimensions());
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut open = send_all(&tx, vec![state_message(&session)]).await;
    while open {
        tokio::select! {
            received = ws_receiver.next() => {
                let Some(Ok(message)) = received else {
                    break;
                };
                let outgoing = match message {
                    Message::Text(raw) => handle_client_message(&mut session, raw.as_str()),
                    Message::Binary(raw) => match std::str::from_utf8(&raw) {
                        Ok(text) => handle_client_message(&mut session, text),
                        Err(_) => vec![error_message("invalid utf8 message")],
                    },
                    Message::Close(_) => break,
                    _ => Vec::new(),
                };
                open = send_all(&tx, outgoing).await;
            }
            _ = interval.tick() => {
                let outgoing: Vec<Value> = session
                    .step(TICK_MS)
                    .iter()
                    .filter_map(|event| serde_json::to_value(event).ok())
                    .collect();
                open = send_all(&tx, outgoing).await;
            }
        }
    }

    drop(tx);
    let _ = writer.await;
    info!(connection_id, "client disconnected");
}

async fn send_all(tx: &mpsc::Sender<String>, messages: Vec<Value>) -> bool {
    for message in messages {
        if tx.send(message.to_string()).await.is_err() {
            return false;
        }
    }
    true
}

fn handle_client_message(session: &mut GameSession, raw: &str) -> Vec<Value> {
    let Some(message) = parse_client_message(raw) else {
        return vec![error_message("invalid message")];
    };
    debug!(?message, "client message");

    match message {
        ParsedClientMessage::Configure {
            player_count,
            height,
        } => {
            let dims = match resolve_dimensions(session.dimensions(), player_count, height) {
                Ok(dims) => dims,
                Err(message) => return vec![error_message(&message)],
            };
            match session.configure(dims) {
                Ok(()) => vec![state_message(session)],
                Err(error) => vec![error_message(&error.to_string())],
            }
        }
        ParsedClientMessage::Generate => match session.regenerate(&mut ThreadRandom) {
            Ok(ladder) => {
                let ladder = json!({ "type": "ladder", "ladder": ladder });
                vec![ladder, state_message(session)]
            }
            Err(error) => vec![error_message(&error.to_string())],
        },
        ParsedClientMessage::Start => match session.start() {
            Ok(event) => serde_json::to_value(&event)
                .map(|value| vec![value])
                .unwrap_or_default(),
            Err(error) => vec![error_message(&error.to_string())],
        },
        ParsedClientMessage::Reset => {
            session.reset();
            vec![state_message(session)]
        }
        ParsedClientMessage::Rename { player_id, name } => {
            match session.rename(&player_id, &name) {
                Ok(()) => vec![state_message(session)],
                Err(error) => vec![error_message(&error.to_string())],
            }
        }
        ParsedClientMessage::Ping { t } => vec![json!({ "type": "pong", "t": t })],
    }
}

fn state_message(session: &GameSession) -> Value {
    json!({
        "type": "state",
        "state": session.state(),
    })
}

fn error_message(message: &str) -> Value {
    json!({
        "type": "error",
        "message": message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dino_ladder_server::constants::{PRE_ROLL_MS, STEP_MS};

    fn message_types(messages: &[Value]) -> Vec<String> {
        messages
            .iter()
            .map(|message| message["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn invalid_message_reports_error() {
        let mut session = GameSession::new(default_dimensions());
        let out = handle_client_message(&mut session, "{}");
        assert_eq!(message_types(&out), vec!["error"]);
    }

    #[test]
    fn configure_rejects_unsupported_height() {
        let mut session = GameSession::new(default_dimensions());
        let out = handle_client_message(&mut session, r#"{"type":"configure","height":9}"#);
        assert_eq!(out[0]["message"], "unsupported height: 9");
        assert_eq!(session.dimensions(), default_dimensions());
    }

    #[test]
    fn generate_then_start_plays_a_full_round() {
        let mut session = GameSession::new(default_dimensions());
        let out = handle_client_message(&mut session, r#"{"type":"configure","playerCount":3,"height":8}"#);
        assert_eq!(out[0]["state"]["dimensions"]["playerCount"], 3);

        let out = handle_client_message(&mut session, r#"{"type":"generate"}"#);
        assert_eq!(message_types(&out), vec!["ladder", "state"]);
        assert_eq!(out[1]["state"]["phase"], "ready");

        let out = handle_client_message(&mut session, r#"{"type":"start"}"#);
        assert_eq!(message_types(&out), vec!["started"]);
        assert_eq!(out[0]["paths"].as_array().map(Vec::len), Some(3));

        let events = session.step(PRE_ROLL_MS + STEP_MS * 9);
        assert!(matches!(
            events.last().map(|event| serde_json::to_value(event).ok()),
            Some(Some(ref value)) if value["type"] == "finished"
        ));
    }

    #[test]
    fn start_without_ladder_is_an_error() {
        let mut session = GameSession::new(default_dimensions());
        let out = handle_client_message(&mut session, r#"{"type":"start"}"#);
        assert_eq!(message_types(&out), vec!["error"]);
    }

    #[test]
    fn ping_echoes_timestamp() {
        let mut session = GameSession::new(default_dimensions());
        let out = handle_client_message(&mut session, r#"{"type":"ping","t":42.5}"#);
        assert_eq!(out, vec![json!({ "type": "pong", "t": 42.5 })]);
    }

    #[test]
    fn ladder_response_rejects_unsupported_players() {
        assert!(build_ladder_response(Some("7"), None).is_err());
        let body = build_ladder_response(Some("5"), Some("15")).expect("supported dimensions");
        assert_eq!(body["finalLanes"].as_array().map(Vec::len), Some(5));
        assert_eq!(body["paths"][0].as_array().map(Vec::len), Some(16));
    }
}
