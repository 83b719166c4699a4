//! Dashboard real-time channel and internal publish endpoint

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::auth::{api_error, ApiError, ApiKeyAuth, ViewerAuth};
use super::AppState;
use crate::hub::{BroadcastEnvelope, FanoutReport, HubHandle, SessionId};

/// GET /ws/dashboard
pub async fn dashboard_ws(
    _auth: ViewerAuth,
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Response {
    let hub = state.hub.clone();
    let buffer = state.config.dashboard.session_buffer;
    let send_timeout = state.config.session_send_timeout();
    ws.on_upgrade(move |socket| run_viewer(socket, hub, buffer, send_timeout))
}

async fn run_viewer(socket: WebSocket, hub: HubHandle, buffer: usize, send_timeout: Duration) {
    let (sink, stream) = socket.split();
    bridge_viewer(sink, stream, hub, buffer, send_timeout).await;
}

/// Bridge one viewer connection to the hub.
///
/// The writer task owns the sink and drains the session's outbound queue; a
/// send that errors or exceeds `send_timeout` ends it. The reader forwards
/// text frames to the hub. Whichever side finishes first ends the session.
pub(crate) async fn bridge_viewer<S, R, E>(
    sink: S,
    mut stream: R,
    hub: HubHandle,
    buffer: usize,
    send_timeout: Duration,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: fmt::Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: fmt::Display,
{
    let (outbound_tx, outbound_rx) = mpsc::channel::<String>(buffer);
    let session_id = match hub.connect(outbound_tx).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Rejecting viewer, hub unavailable");
            return;
        }
    };

    let mut writer = tokio::spawn(write_frames(sink, outbound_rx, send_timeout, session_id));

    loop {
        tokio::select! {
            _ = &mut writer => break,
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if hub.inbound(session_id, text).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Binary and transport-level ping/pong frames carry no control messages
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(session_id = %session_id, error = %e, "Viewer socket error");
                    break;
                }
            },
        }
    }

    let _ = hub.disconnect(session_id).await;
    writer.abort();
}

async fn write_frames<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<String>,
    send_timeout: Duration,
    session_id: SessionId,
) where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    while let Some(frame) = outbound.recv().await {
        match tokio::time::timeout(send_timeout, sink.send(Message::Text(frame))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(session_id = %session_id, error = %e, "Viewer send failed");
                break;
            }
            Err(_) => {
                warn!(session_id = %session_id, "Viewer send timed out");
                break;
            }
        }
    }
    let _ = tokio::time::timeout(send_timeout, sink.close()).await;
}

/// POST /internal/broadcast
pub async fn publish_broadcast(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
    Json(envelope): Json<BroadcastEnvelope>,
) -> Result<Json<FanoutReport>, ApiError> {
    state
        .hub
        .publish(envelope)
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
}
