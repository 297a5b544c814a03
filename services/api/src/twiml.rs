//! TwiML documents that point the telephony platform at our media-stream sockets.

/// Path of the socket used for calls that dialed in.
pub const INBOUND_STREAM_PATH: &str = "/media-stream";
/// Path of the socket used for calls we placed.
pub const OUTBOUND_STREAM_PATH: &str = "/outbound-media-stream";

/// TwiML connecting an incoming call to the inbound media stream.
pub fn inbound_stream(host: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Connect>
    <Stream url="wss://{host}{path}" />
  </Connect>
</Response>"#,
        host = escape_xml(host),
        path = INBOUND_STREAM_PATH,
    )
}

/// TwiML connecting an outbound call to its media stream, carrying the prompt
/// as a custom parameter so it arrives with the `start` event.
pub fn outbound_stream(host: &str, prompt: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Connect>
    <Stream url="wss://{host}{path}">
      <Parameter name="prompt" value="{prompt}" />
    </Stream>
  </Connect>
</Response>"#,
        host = escape_xml(host),
        path = OUTBOUND_STREAM_PATH,
        prompt = escape_xml(prompt),
    )
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
