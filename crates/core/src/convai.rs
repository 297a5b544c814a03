//! Defines the JSON message protocol of the conversational-AI voice socket.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages received from the AI backend.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendEvent {
    /// Sent once the backend has accepted the conversation. Informational.
    ConversationInitiationMetadata {
        conversation_initiation_metadata_event: Option<InitiationMetadata>,
    },
    /// A chunk of agent speech. The backend uses either shape.
    Audio {
        audio: Option<AudioChunk>,
        audio_event: Option<AudioEvent>,
    },
    /// The caller spoke over the agent; queued playback must be discarded.
    Interruption { interruption_event: Option<Value> },
    /// Keepalive that must be answered with a `pong`.
    Ping { ping_event: Option<PingEvent> },
    /// What the backend heard the caller say.
    UserTranscript {
        user_transcription_event: Option<UserTranscription>,
    },
    /// Text of what the agent is about to say.
    AgentResponse {
        agent_response_event: Option<AgentResponseText>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct InitiationMetadata {
    pub conversation_id: Option<String>,
    pub agent_output_audio_format: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub chunk: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AudioEvent {
    pub audio_base_64: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PingEvent {
    #[serde(default)]
    pub event_id: Value,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UserTranscription {
    pub user_transcript: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AgentResponseText {
    pub agent_response: Option<String>,
}

impl BackendEvent {
    /// The audio payload of an `audio` message, whichever shape carries it.
    pub fn audio_payload(&self) -> Option<&str> {
        let BackendEvent::Audio { audio, audio_event } = self else {
            return None;
        };
        audio
            .as_ref()
            .and_then(|a| a.chunk.as_deref())
            .or_else(|| audio_event.as_ref()?.audio_base_64.as_deref())
    }
}

/// Peeks at the `type` tag of a frame, for logging messages we do not handle.
#[derive(Deserialize, Debug)]
pub(crate) struct TypeTag {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Messages sent to the AI backend.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BackendCommand {
    /// Caller audio, base64 encoded. This frame has no `type` field.
    UserAudio { user_audio_chunk: String },
    Control(ControlMessage),
}

/// Typed control messages sent to the AI backend.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Reply to a backend `ping`, echoing its event id.
    Pong { event_id: Value },
    /// Overrides the agent prompt and greeting for this conversation.
    ConversationInitiationClientData {
        conversation_config_override: ConversationConfigOverride,
    },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConversationConfigOverride {
    pub agent: AgentOverride,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AgentOverride {
    pub prompt: PromptOverride,
    pub first_message: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PromptOverride {
    pub prompt: String,
}

impl BackendCommand {
    pub fn pong(event_id: Value) -> Self {
        BackendCommand::Control(ControlMessage::Pong { event_id })
    }

    pub fn initiation(prompt: impl Into<String>, first_message: impl Into<String>) -> Self {
        BackendCommand::Control(ControlMessage::ConversationInitiationClientData {
            conversation_config_override: ConversationConfigOverride {
                agent: AgentOverride {
                    prompt: PromptOverride {
                        prompt: prompt.into(),
                    },
                    first_message: first_message.into(),
                },
            },
        })
    }
}
