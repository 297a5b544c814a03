//! Defines the JSON message protocol spoken by the telephony media stream.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Events received from the telephony platform over the media-stream socket.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    /// Streaming has started; carries the call identifiers.
    Start(StartEvent),
    /// A chunk of caller audio (base64 encoded).
    Media(MediaEvent),
    /// The stream has ended. This is the normal end-of-call signal.
    Stop {
        #[serde(rename = "streamSid")]
        stream_sid: Option<String>,
    },
    /// Anything else (`connected`, `mark`, `dtmf`, ...).
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StartEvent {
    #[serde(rename = "streamSid")]
    stream_sid: Option<String>,
    #[serde(rename = "callSid")]
    call_sid: Option<String>,
    #[serde(rename = "customParameters")]
    custom_parameters: Option<Map<String, Value>>,
    start: Option<StartMetadata>,
}

/// The nested `start` object the platform attaches to a `start` event.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartMetadata {
    stream_sid: Option<String>,
    call_sid: Option<String>,
    custom_parameters: Option<Map<String, Value>>,
}

impl StartEvent {
    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid
            .as_deref()
            .or_else(|| self.start.as_ref()?.stream_sid.as_deref())
    }

    pub fn call_sid(&self) -> Option<&str> {
        self.start
            .as_ref()
            .and_then(|s| s.call_sid.as_deref())
            .or(self.call_sid.as_deref())
    }

    pub fn custom_parameters(&self) -> Option<&Map<String, Value>> {
        self.start
            .as_ref()
            .and_then(|s| s.custom_parameters.as_ref())
            .or(self.custom_parameters.as_ref())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MediaEvent {
    #[serde(rename = "streamSid")]
    pub stream_sid: Option<String>,
    pub media: MediaPayload,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MediaPayload {
    pub payload: String,
}

/// Peeks at the `event` tag of a frame, for logging events we do not handle.
#[derive(Deserialize, Debug)]
pub(crate) struct EventTag {
    pub event: Option<String>,
}

/// Messages sent to the telephony platform.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyCommand {
    /// Plays a chunk of AI audio to the caller.
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: MediaPayload,
    },
    /// Discards any audio queued for playback (barge-in).
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_start_with_nested_metadata() {
        let raw = json!({
            "event": "start",
            "sequenceNumber": "1",
            "streamSid": "MZ1",
            "start": {
                "streamSid": "MZ1",
                "accountSid": "AC1",
                "callSid": "CA1",
                "tracks": ["inbound"],
                "customParameters": { "prompt": "be brief" }
            }
        });
        let event: TelephonyEvent = serde_json::from_value(raw).unwrap();
        let TelephonyEvent::Start(start) = event else {
            panic!("expected start event");
        };
        assert_eq!(start.stream_sid(), Some("MZ1"));
        assert_eq!(start.call_sid(), Some("CA1"));
        assert_eq!(
            start.custom_parameters().unwrap().get("prompt"),
            Some(&json!("be brief"))
        );
    }

    #[test]
    fn test_parse_start_with_flat_fields() {
        let raw = r#"{"event":"start","streamSid":"S1","callSid":"C1","customParameters":{"prompt":"x"}}"#;
        let TelephonyEvent::Start(start) = serde_json::from_str(raw).unwrap() else {
            panic!("expected start event");
        };
        assert_eq!(start.stream_sid(), Some("S1"));
        assert_eq!(start.call_sid(), Some("C1"));
        assert!(start.custom_parameters().is_some());
    }

    #[test]
    fn test_parse_media_and_stop() {
        let raw = r#"{"event":"media","streamSid":"S1","media":{"track":"inbound","chunk":"2","payload":"AAAA"}}"#;
        let event: TelephonyEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            TelephonyEvent::Media(MediaEvent {
                stream_sid: Some("S1".into()),
                media: MediaPayload {
                    payload: "AAAA".into()
                },
            })
        );

        let raw = r#"{"event":"stop","streamSid":"S1","stop":{"callSid":"C1"}}"#;
        let event: TelephonyEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(
            event,
            TelephonyEvent::Stop {
                stream_sid: Some("S1".into())
            }
        );
    }

    #[test]
    fn test_unknown_event_is_not_an_error() {
        let raw = r#"{"event":"connected","protocol":"Call","version":"1.0.0"}"#;
        let event: TelephonyEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event, TelephonyEvent::Unknown);
    }

    #[test]
    fn test_media_without_payload_is_malformed() {
        let raw = r#"{"event":"media","streamSid":"S1"}"#;
        assert!(serde_json::from_str::<TelephonyEvent>(raw).is_err());
    }

    #[test]
    fn test_serialize_commands() {
        let media = TelephonyCommand::Media {
            stream_sid: "S1".into(),
            media: MediaPayload {
                payload: "XYZ".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&media).unwrap(),
            json!({ "event": "media", "streamSid": "S1", "media": { "payload": "XYZ" } })
        );

        let clear = TelephonyCommand::Clear {
            stream_sid: "S1".into(),
        };
        assert_eq!(
            serde_json::to_value(&clear).unwrap(),
            json!({ "event": "clear", "streamSid": "S1" })
        );
    }
}
