//! Voicebridge Core
//!
//! The dual-socket relay between a telephony media stream and a
//! conversational-AI voice session. Nothing in this crate opens a socket:
//! the service crate plugs real sockets in through [`upstream::Leg`] and
//! [`upstream::UpstreamConnector`].

pub mod convai;
pub mod error;
pub mod lifecycle;
pub mod session;
pub mod telephony;
pub mod translator;
pub mod upstream;

pub use error::RelayError;
pub use lifecycle::{CloseReason, RelayState, RelaySummary, run_relay};
pub use translator::{CallFlow, ConversationDefaults, Translator};
