//! Manages the telephony media-stream connection lifecycle for one call.

use super::pump;
use crate::state::AppState;
use axum::{
    extract::{State, ws::WebSocket, ws::WebSocketUpgrade},
    response::Response,
};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{info, instrument};
use voicebridge_core::{
    CallFlow, Translator, run_relay,
    upstream::{LEG_CHANNEL_CAPACITY, Leg},
};

/// Axum handler for media streams of calls that dialed in.
pub async fn inbound_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state, CallFlow::Inbound))
}

/// Axum handler for media streams of calls we placed.
pub async fn outbound_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state, CallFlow::Outbound))
}

/// Runs the relay for one accepted telephony connection.
///
/// The relay owns both legs; when it returns, both sockets have been asked to
/// close and nothing from this call outlives the function.
#[instrument(name = "media_stream", skip_all, fields(connection_id, flow = ?flow, stream_sid))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, flow: CallFlow) {
    let connection_id: u32 = rand::random();
    tracing::Span::current().record("connection_id", connection_id);
    info!("Telephony connected to media stream.");

    let (socket_tx, socket_rx) = socket.split();
    let (leg, peer) = Leg::pair(LEG_CHANNEL_CAPACITY);
    pump::spawn_telephony(socket_tx, socket_rx, peer);

    let translator = Translator::new(flow, state.conversation_defaults.clone());
    let summary = run_relay(translator, state.connector.clone(), leg).await;

    if let Some(stream_sid) = summary.session.stream_sid() {
        tracing::Span::current().record("stream_sid", stream_sid);
    }
    info!(
        reason = %summary.reason,
        call_sid = ?summary.session.call_sid(),
        forwarded = summary.stats.caller_frames_forwarded,
        dropped = summary.stats.caller_frames_dropped,
        played = summary.stats.agent_chunks_forwarded,
        "Telephony client disconnected."
    );
}
