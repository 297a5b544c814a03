//! Error taxonomy for the relay core.

/// Failures surfaced while relaying a call.
///
/// `SignedUrl` and `Connect` are setup errors and end the affected call.
/// `Malformed` and `InvalidAudio` are recovered per message. `Transport`
/// ends the call by closing both legs.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Failed to get signed URL: {0}")]
    SignedUrl(String),
    #[error("Failed to open upstream socket: {0}")]
    Connect(String),
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid base64 audio payload: {0}")]
    InvalidAudio(#[from] base64::DecodeError),
    #[error("Transport error: {0}")]
    Transport(String),
}

impl RelayError {
    /// Whether the error only affects a single message and the call can go on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RelayError::Malformed(_) | RelayError::InvalidAudio(_))
    }
}
