//! Per-call session state shared by both relay directions.

use serde_json::{Map, Value};

/// Identifiers and parameters for one telephony call.
///
/// Created empty when the telephony connection is accepted and filled in as
/// `start` and `media` events arrive. All mutation goes through the setters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallSession {
    stream_sid: Option<String>,
    call_sid: Option<String>,
    custom_parameters: Option<Map<String, Value>>,
}

impl CallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn call_sid(&self) -> Option<&str> {
        self.call_sid.as_deref()
    }

    pub fn custom_parameters(&self) -> Option<&Map<String, Value>> {
        self.custom_parameters.as_ref()
    }

    /// Records the stream id. The latest value always wins.
    pub fn set_stream_sid(&mut self, stream_sid: impl Into<String>) {
        self.stream_sid = Some(stream_sid.into());
    }

    /// Records the call id. Only the first value sticks.
    pub fn set_call_sid(&mut self, call_sid: impl Into<String>) {
        if self.call_sid.is_none() {
            self.call_sid = Some(call_sid.into());
        }
    }

    pub fn set_custom_parameters(&mut self, params: Map<String, Value>) {
        self.custom_parameters = Some(params);
    }

    /// The `prompt` custom parameter, if one was supplied and is non-empty.
    pub fn custom_prompt(&self) -> Option<&str> {
        self.custom_parameters
            .as_ref()?
            .get("prompt")?
            .as_str()
            .filter(|p| !p.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_session_is_empty() {
        let session = CallSession::new();
        assert_eq!(session.stream_sid(), None);
        assert_eq!(session.call_sid(), None);
        assert!(session.custom_parameters().is_none());
        assert_eq!(session.custom_prompt(), None);
    }

    #[test]
    fn test_stream_sid_latest_wins() {
        let mut session = CallSession::new();
        session.set_stream_sid("MZ1");
        session.set_stream_sid("MZ2");
        assert_eq!(session.stream_sid(), Some("MZ2"));
    }

    #[test]
    fn test_call_sid_set_once() {
        let mut session = CallSession::new();
        session.set_call_sid("CA1");
        session.set_call_sid("CA2");
        assert_eq!(session.call_sid(), Some("CA1"));
    }

    #[test]
    fn test_custom_prompt() {
        let mut session = CallSession::new();
        let params = json!({ "prompt": "you sell boats" });
        session.set_custom_parameters(params.as_object().unwrap().clone());
        assert_eq!(session.custom_prompt(), Some("you sell boats"));

        let params = json!({ "prompt": "   " });
        session.set_custom_parameters(params.as_object().unwrap().clone());
        assert_eq!(session.custom_prompt(), None);

        let params = json!({ "prompt": 42 });
        session.set_custom_parameters(params.as_object().unwrap().clone());
        assert_eq!(session.custom_prompt(), None);
    }
}
