//! WebSocket Relay Plumbing
//!
//! This module plugs real sockets into the relay core. It is structured into
//! submodules for clarity:
//!
//! - `session`: Upgrades telephony media-stream connections and runs one relay per call.
//! - `upstream`: Fetches a signed URL and opens the conversational-AI socket.
//! - `pump`: Bridges a socket's read and write halves to the core's channels.

mod pump;
pub mod session;
pub mod upstream;

pub use session::{inbound_stream_handler, outbound_stream_handler};
