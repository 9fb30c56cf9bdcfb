use std::future::Future;
use std::path::Path;

use axum::{
    Json, Router,
    extract::{Query, State, WebSocketUpgrade, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::engine::SimulationSession;
use common::games::snake::{GameSnapshot, RemoteAction};
use common::{log, log_warn};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::error::ServerError;
use crate::transactions::{TokenInfo, TransactionFeed, TransactionView};
use crate::ws_handler::handle_websocket;

#[derive(Clone)]
pub struct WebServerState {
    pub session: SimulationSession,
    pub feed: TransactionFeed,
}

#[derive(Debug, Deserialize)]
pub struct RemoteControlRequest {
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteControlResponse {
    pub success: bool,
    pub message: String,
    pub deaths: u64,
    pub game_state: GameSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreResponse {
    pub success: bool,
    pub game_state: GameSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct TokenTransactionsQuery {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransactionsResponse {
    pub transactions: Vec<TransactionView>,
    pub new_transactions_count: usize,
    pub pending_moves: u64,
    pub token_info: TokenInfo,
    pub game_state: GameSnapshot,
}

pub fn build_router(state: WebServerState, static_dir: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/state", get(get_state).post(restore_state))
        .route("/api/update-game", post(update_game))
        .route("/api/remote-control", post(remote_control))
        .route("/api/token-transactions", get(token_transactions))
        .route("/ws", get(ws_upgrade_handler));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors).with_state(state)
}

pub async fn run_web_server(
    state: WebServerState,
    listen_address: &str,
    static_dir: Option<&Path>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = build_router(state, static_dir);

    let listener = tokio::net::TcpListener::bind(listen_address).await?;
    log!("Web server listening on {}", listen_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn get_state(State(state): State<WebServerState>) -> Json<GameSnapshot> {
    Json(state.session.snapshot().await)
}

async fn update_game(State(state): State<WebServerState>) -> Json<GameSnapshot> {
    Json(state.session.force_update().await)
}

async fn restore_state(
    State(state): State<WebServerState>,
    Json(snapshot): Json<GameSnapshot>,
) -> Result<Json<RestoreResponse>, ServerError> {
    let game_state = state.session.restore(&snapshot).await.inspect_err(|e| {
        log_warn!("Rejected posted state: {}", e);
    })?;

    Ok(Json(RestoreResponse {
        success: true,
        game_state,
    }))
}

fn remote_control_failure(message: String) -> Response {
    let body = serde_json::json!({
        "success": false,
        "message": message,
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

async fn remote_control(
    State(state): State<WebServerState>,
    payload: Result<Json<RemoteControlRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            log_warn!("Malformed remote control request: {}", rejection.body_text());
            return remote_control_failure(rejection.body_text());
        }
    };
    let action = match request.action.parse::<RemoteAction>() {
        Ok(action) => action,
        Err(e) => return remote_control_failure(e.to_string()),
    };

    let game_state = state.session.remote_control(action).await;
    let message = match action {
        RemoteAction::Suicide => "Snake reset to its starting position".to_string(),
        RemoteAction::Shrink => format!("Snake shrunk to length {}", game_state.snake.len()),
    };

    Json(RemoteControlResponse {
        success: true,
        message,
        deaths: game_state.deaths,
        game_state,
    })
    .into_response()
}

async fn token_transactions(
    State(state): State<WebServerState>,
    Query(query): Query<TokenTransactionsQuery>,
) -> Result<Json<TokenTransactionsResponse>, ServerError> {
    let address = query
        .address
        .filter(|address| !address.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("Token address is required".to_string()))?;

    let report = state.feed.poll(&address).await.inspect_err(|e| {
        log_warn!("Transfer lookup for {} failed: {}", address, e);
    })?;
    let game_state = state.session.force_update().await;

    Ok(Json(TokenTransactionsResponse {
        transactions: report.transactions,
        new_transactions_count: report.new_count,
        pending_moves: game_state.pending_moves,
        token_info: report.token_info,
        game_state,
    }))
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    State(state): State<WebServerState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state.session))
}
