//! The seam between the relay core and the sockets it drives.
//!
//! Each side of a call is a [`Leg`]: an ordered stream of inbound
//! [`LegEvent`]s and a sender for [`Outbound`] frames. Socket pumps own the
//! other end ([`LegPeer`]). Inbound events are bounded so a slow relay pushes
//! back on the socket reader; outbound frames are queued without waiting, so
//! a stalled writer on one leg never stops the relay from reading either leg.

use crate::error::RelayError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Depth of the inbound event channel between a socket pump and the coordinator.
pub const LEG_CHANNEL_CAPACITY: usize = 128;

/// Something that happened on a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegEvent {
    /// A text frame.
    Text(String),
    /// The socket closed, cleanly or not.
    Closed,
    /// The socket failed.
    Error(String),
}

/// A frame to write to a socket.
///
/// Pumps also close their socket when the sender side is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// Close the socket. Nothing is written after this.
    Close,
}

/// The coordinator's end of one socket.
#[derive(Debug)]
pub struct Leg {
    pub events: mpsc::Receiver<LegEvent>,
    pub outbound: mpsc::UnboundedSender<Outbound>,
}

/// The socket pump's end of one socket.
#[derive(Debug)]
pub struct LegPeer {
    pub events: mpsc::Sender<LegEvent>,
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl Leg {
    /// Creates a connected `Leg`/`LegPeer` pair with `capacity` inbound events.
    pub fn pair(capacity: usize) -> (Leg, LegPeer) {
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        (
            Leg {
                events: event_rx,
                outbound: out_tx,
            },
            LegPeer {
                events: event_tx,
                outbound: out_rx,
            },
        )
    }

    /// Queues a text frame. Never waits on the socket writer.
    pub fn send_text(&self, text: String) -> Result<(), RelayError> {
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_| RelayError::Transport("socket writer has shut down".to_string()))
    }

    /// Asks the socket to close. Errors from an already-closed socket are ignored.
    pub fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

/// Opens the AI-backend leg for one call.
///
/// Implementations must fetch a fresh signed URL on every call; the URL is
/// single-use and is never cached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UpstreamConnector: Send + Sync {
    async fn connect(&self) -> Result<Leg, RelayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_leg_pair_round_trip() {
        let (mut leg, mut peer) = Leg::pair(4);

        leg.send_text("hello".to_string()).unwrap();
        assert_eq!(
            peer.outbound.recv().await,
            Some(Outbound::Text("hello".to_string()))
        );

        peer.events.send(LegEvent::Closed).await.unwrap();
        assert_eq!(leg.events.recv().await, Some(LegEvent::Closed));
    }

    #[tokio::test]
    async fn test_close_on_dead_socket_is_silent() {
        let (leg, peer) = Leg::pair(4);
        drop(peer);
        leg.close();
        assert!(leg.send_text("late".to_string()).is_err());
    }

    #[tokio::test]
    async fn test_send_does_not_wait_for_slow_writer() {
        let (leg, mut peer) = Leg::pair(1);
        for i in 0..64 {
            leg.send_text(i.to_string()).unwrap();
        }
        leg.close();

        let mut frames = 0;
        while let Ok(frame) = peer.outbound.try_recv() {
            if frame == Outbound::Close {
                break;
            }
            frames += 1;
        }
        assert_eq!(frames, 64);
    }
}
