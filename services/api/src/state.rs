//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the upstream connector and the Twilio client.
//! Nothing in here is per-call: each relay owns its own session.

use crate::twilio::TwilioClient;
use std::sync::Arc;
use voicebridge_core::{ConversationDefaults, upstream::UpstreamConnector};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn UpstreamConnector>,
    /// `None` when outbound calling is not configured.
    pub twilio: Option<TwilioClient>,
    pub conversation_defaults: ConversationDefaults,
}
