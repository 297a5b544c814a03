//! Message-level translation between the telephony and AI-backend protocols.
//!
//! The [`Translator`] never touches a socket. Each raw text frame from either
//! side goes in, and at most one [`Action`] comes out for the coordinator to
//! carry out. This keeps dispatch free of suspension points.

use crate::{
    convai::{BackendCommand, BackendEvent, TypeTag},
    error::RelayError,
    session::CallSession,
    telephony::{EventTag, MediaPayload, TelephonyCommand, TelephonyEvent},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use tracing::{debug, info, warn};

pub const DEFAULT_PROMPT: &str = "you are a gary from the phone store";
pub const DEFAULT_FIRST_MESSAGE: &str = "hey there! how can I help you today?";

/// Which kind of call the telephony connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFlow {
    /// The caller dialed in; the backend is connected as soon as the socket is accepted.
    Inbound,
    /// We placed the call; the backend is connected once `start` delivers the prompt.
    Outbound,
}

/// Agent settings used to seed an outbound conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationDefaults {
    pub prompt: String,
    pub first_message: String,
}

impl Default for ConversationDefaults {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            first_message: DEFAULT_FIRST_MESSAGE.to_string(),
        }
    }
}

/// Side effects requested by the translator.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send a message on the backend leg.
    ToBackend(BackendCommand),
    /// Send a message on the telephony leg.
    ToTelephony(TelephonyCommand),
    /// Open the backend leg now.
    ConnectUpstream,
    /// The telephony stream ended; close the backend leg.
    CloseBackend,
}

/// Running counters for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Caller audio frames forwarded to the backend.
    pub caller_frames_forwarded: u64,
    /// Caller audio frames dropped because the backend was not open yet.
    pub caller_frames_dropped: u64,
    /// Agent audio chunks forwarded to telephony.
    pub agent_chunks_forwarded: u64,
    /// Agent audio chunks dropped for lack of a payload or stream id.
    pub agent_chunks_dropped: u64,
    /// Frames on either leg that failed to parse.
    pub malformed_messages: u64,
}

/// Per-call protocol state machine.
#[derive(Debug)]
pub struct Translator {
    flow: CallFlow,
    defaults: ConversationDefaults,
    session: CallSession,
    stats: RelayStats,
}

impl Translator {
    pub fn new(flow: CallFlow, defaults: ConversationDefaults) -> Self {
        Self {
            flow,
            defaults,
            session: CallSession::new(),
            stats: RelayStats::default(),
        }
    }

    pub fn flow(&self) -> CallFlow {
        self.flow
    }

    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Handles one frame from the telephony leg.
    ///
    /// `backend_open` reports whether the backend leg can take messages right
    /// now. Media arriving while it cannot is dropped, never buffered.
    pub fn on_telephony_frame(
        &mut self,
        raw: &str,
        backend_open: bool,
    ) -> Result<Option<Action>, RelayError> {
        let event = self.parse(raw)?;
        match event {
            TelephonyEvent::Start(start) => {
                if let Some(stream_sid) = start.stream_sid() {
                    self.session.set_stream_sid(stream_sid);
                }
                if let Some(call_sid) = start.call_sid() {
                    self.session.set_call_sid(call_sid);
                }
                if let Some(params) = start.custom_parameters() {
                    self.session.set_custom_parameters(params.clone());
                }
                info!(
                    stream_sid = ?self.session.stream_sid(),
                    call_sid = ?self.session.call_sid(),
                    "Telephony stream started."
                );
                match self.flow {
                    CallFlow::Outbound => Ok(Some(Action::ConnectUpstream)),
                    CallFlow::Inbound => Ok(None),
                }
            }
            TelephonyEvent::Media(media) => {
                if let Some(stream_sid) = media.stream_sid {
                    self.session.set_stream_sid(stream_sid);
                }
                if !backend_open {
                    self.stats.caller_frames_dropped += 1;
                    debug!("Backend not open yet; dropping caller audio frame.");
                    return Ok(None);
                }
                let audio = STANDARD.decode(media.media.payload.as_bytes())?;
                self.stats.caller_frames_forwarded += 1;
                Ok(Some(Action::ToBackend(BackendCommand::UserAudio {
                    user_audio_chunk: STANDARD.encode(audio),
                })))
            }
            TelephonyEvent::Stop { .. } => {
                info!(stream_sid = ?self.session.stream_sid(), "Telephony stream ended.");
                Ok(Some(Action::CloseBackend))
            }
            TelephonyEvent::Unknown => {
                let tag = serde_json::from_str::<EventTag>(raw)
                    .ok()
                    .and_then(|t| t.event);
                debug!(event = ?tag, "Ignoring unhandled telephony event.");
                Ok(None)
            }
        }
    }

    /// Handles one frame from the backend leg.
    pub fn on_backend_frame(&mut self, raw: &str) -> Result<Option<Action>, RelayError> {
        let event: BackendEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                self.stats.malformed_messages += 1;
                return Err(e.into());
            }
        };
        match &event {
            BackendEvent::ConversationInitiationMetadata {
                conversation_initiation_metadata_event,
            } => {
                let conversation_id = conversation_initiation_metadata_event
                    .as_ref()
                    .and_then(|m| m.conversation_id.as_deref());
                info!(?conversation_id, "Received conversation initiation metadata.");
                Ok(None)
            }
            BackendEvent::Audio { .. } => {
                let Some(payload) = event.audio_payload() else {
                    self.stats.agent_chunks_dropped += 1;
                    return Ok(None);
                };
                let Some(stream_sid) = self.session.stream_sid() else {
                    self.stats.agent_chunks_dropped += 1;
                    warn!("Received agent audio before a stream id was known; dropping.");
                    return Ok(None);
                };
                self.stats.agent_chunks_forwarded += 1;
                Ok(Some(Action::ToTelephony(TelephonyCommand::Media {
                    stream_sid: stream_sid.to_string(),
                    media: MediaPayload {
                        payload: payload.to_string(),
                    },
                })))
            }
            BackendEvent::Interruption { .. } => {
                let Some(stream_sid) = self.session.stream_sid() else {
                    warn!("Received interruption before a stream id was known; dropping.");
                    return Ok(None);
                };
                debug!("Caller barged in; clearing queued playback.");
                Ok(Some(Action::ToTelephony(TelephonyCommand::Clear {
                    stream_sid: stream_sid.to_string(),
                })))
            }
            BackendEvent::Ping { ping_event } => Ok(ping_event
                .as_ref()
                .filter(|p| !p.event_id.is_null())
                .map(|p| Action::ToBackend(BackendCommand::pong(p.event_id.clone())))),
            BackendEvent::UserTranscript {
                user_transcription_event,
            } => {
                let text = user_transcription_event
                    .as_ref()
                    .and_then(|e| e.user_transcript.as_deref());
                info!(transcript = ?text, "Caller said.");
                Ok(None)
            }
            BackendEvent::AgentResponse {
                agent_response_event,
            } => {
                let text = agent_response_event
                    .as_ref()
                    .and_then(|e| e.agent_response.as_deref());
                info!(response = ?text, "Agent said.");
                Ok(None)
            }
            BackendEvent::Unknown => {
                let kind = serde_json::from_str::<TypeTag>(raw).ok().and_then(|t| t.kind);
                debug!(message_type = ?kind, "Ignoring unhandled backend message.");
                Ok(None)
            }
        }
    }

    /// The first message to send once the backend leg opens, if any.
    ///
    /// Only outbound calls seed the conversation; the prompt comes from the
    /// call's custom parameters when present.
    pub fn initiation_message(&self) -> Option<BackendCommand> {
        if self.flow != CallFlow::Outbound {
            return None;
        }
        let prompt = self
            .session
            .custom_prompt()
            .unwrap_or(self.defaults.prompt.as_str());
        info!(prompt, "Seeding conversation with prompt.");
        Some(BackendCommand::initiation(
            prompt,
            self.defaults.first_message.clone(),
        ))
    }

    fn parse(&mut self, raw: &str) -> Result<TelephonyEvent, RelayError> {
        serde_json::from_str(raw).map_err(|e| {
            self.stats.malformed_messages += 1;
            e.into()
        })
    }
}
