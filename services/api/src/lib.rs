//! Voicebridge API Library Crate
//!
//! This library contains the web-facing half of the relay: configuration,
//! shared state, the TwiML and outbound-call handlers, the media-stream
//! WebSocket plumbing, and routing. The `api` binary is a thin wrapper
//! around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod twilio;
pub mod twiml;
pub mod ws;
