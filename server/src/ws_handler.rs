use axum::extract::ws::{Message, WebSocket};
use common::engine::SimulationSession;
use common::games::snake::GameSnapshot;
use common::{log, log_warn};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

/// Streams the state to one viewer: the current snapshot on connect, then a
/// fresh one after every change. Incoming messages are ignored.
pub async fn handle_websocket(socket: WebSocket, session: SimulationSession) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Subscribe before taking the initial snapshot.
    let mut updates = session.subscribe();
    let initial = session.snapshot().await;

    let send_task = tokio::spawn(async move {
        if send_snapshot(&mut ws_sender, &initial).await.is_err() {
            return;
        }
        loop {
            match updates.recv().await {
                Ok(snapshot) => {
                    if send_snapshot(&mut ws_sender, &snapshot).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log_warn!("WebSocket viewer lagged, skipped {} updates", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    log!("WebSocket viewer connected");

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        }
    }

    send_task.abort();
    log!("WebSocket viewer disconnected");
}

async fn send_snapshot(
    sender: &mut SplitSink<WebSocket, Message>,
    snapshot: &GameSnapshot,
) -> Result<(), ()> {
    let text = match serde_json::to_string(snapshot) {
        Ok(text) => text,
        Err(e) => {
            log_warn!("Failed to encode snapshot: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}
