//! Socket pumps: one reader task and one writer task per socket.
//!
//! Readers turn frames into [`LegEvent`]s in arrival order. Writers drain
//! [`Outbound`] frames so the relay loop never waits on the network.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{Error as WsError, protocol::Message as WsMessage},
};
use tracing::{debug, warn};
use voicebridge_core::upstream::{LegEvent, LegPeer, Outbound};

type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Pumps the telephony media-stream socket.
pub(super) fn spawn_telephony(
    sink: SplitSink<WebSocket, Message>,
    stream: SplitStream<WebSocket>,
    peer: LegPeer,
) {
    let LegPeer { events, outbound } = peer;
    tokio::spawn(write_telephony(sink, outbound));
    tokio::spawn(read_telephony(stream, events));
}

/// Pumps the conversational-AI socket.
pub(super) fn spawn_upstream(
    sink: SplitSink<UpstreamSocket, WsMessage>,
    stream: SplitStream<UpstreamSocket>,
    peer: LegPeer,
) {
    let LegPeer { events, outbound } = peer;
    tokio::spawn(write_upstream(sink, outbound));
    tokio::spawn(read_upstream(stream, events));
}

async fn write_telephony(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            Outbound::Text(text) => {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!(error = %e, "Failed to write to telephony socket.");
                    return;
                }
            }
            Outbound::Close => break,
        }
    }
    let _ = sink.send(Message::Close(None)).await;
    debug!("Telephony writer finished.");
}

async fn read_telephony(mut stream: SplitStream<WebSocket>, events: mpsc::Sender<LegEvent>) {
    while let Some(result) = stream.next().await {
        let event = match result {
            Ok(Message::Text(text)) => LegEvent::Text(text.as_str().to_owned()),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => LegEvent::Error(e.to_string()),
        };
        let failed = matches!(event, LegEvent::Error(_));
        if events.send(event).await.is_err() || failed {
            return;
        }
    }
    let _ = events.send(LegEvent::Closed).await;
}

async fn write_upstream(
    mut sink: SplitSink<UpstreamSocket, WsMessage>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            Outbound::Text(text) => {
                if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                    warn!(error = %e, "Failed to write to backend socket.");
                    return;
                }
            }
            Outbound::Close => break,
        }
    }
    if let Err(e) = sink.close().await {
        if !matches!(e, WsError::ConnectionClosed | WsError::AlreadyClosed) {
            debug!(error = %e, "Backend socket did not close cleanly.");
        }
    }
    debug!("Backend writer finished.");
}

async fn read_upstream(mut stream: SplitStream<UpstreamSocket>, events: mpsc::Sender<LegEvent>) {
    while let Some(result) = stream.next().await {
        let event = match result {
            Ok(WsMessage::Text(text)) => LegEvent::Text(text.as_str().to_owned()),
            Ok(WsMessage::Close(frame)) => {
                debug!(?frame, "Backend sent close frame.");
                break;
            }
            Ok(_) => continue,
            Err(e) => LegEvent::Error(e.to_string()),
        };
        let failed = matches!(event, LegEvent::Error(_));
        if events.send(event).await.is_err() || failed {
            return;
        }
    }
    let _ = events.send(LegEvent::Closed).await;
}
