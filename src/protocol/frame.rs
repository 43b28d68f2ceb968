//! Frame codec.
//!
//! Frames are line oriented and terminated by a single NUL byte:
//!
//! ```text
//! COMMAND
//! header1:value1
//! header2:value2
//!
//! body...\0
//! ```
//!
//! Decoding is total: a malformed header line is skipped and a missing
//! header/body boundary yields an empty body. What to do with a frame is
//! decided by the connection manager and the router, not here.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::identifiers::SubscriptionId;

// ============================================================================
// Constants
// ============================================================================

/// Frame terminator.
const NUL: char = '\0';

/// Header carrying the topic a message was published on or is sent to.
pub const HEADER_DESTINATION: &str = "destination";

/// Subscription id header.
pub const HEADER_ID: &str = "id";

/// Handshake protocol version header.
pub const HEADER_ACCEPT_VERSION: &str = "accept-version";

/// Handshake heartbeat negotiation header.
pub const HEADER_HEART_BEAT: &str = "heart-beat";

// ============================================================================
// FrameCommand
// ============================================================================

/// Frame command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameCommand {
    /// Client handshake.
    Connect,
    /// Server handshake acknowledgment.
    Connected,
    /// Client subscription request.
    Subscribe,
    /// Server delivery on a subscribed topic.
    Message,
    /// Client publish (keep-alive pings).
    Send,
    /// Any other command (`ERROR`, `RECEIPT`, heartbeat EOLs, ...).
    Other(String),
}

impl FrameCommand {
    /// Returns the wire spelling of the command.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Message => "MESSAGE",
            Self::Send => "SEND",
            Self::Other(command) => command,
        }
    }

    /// Parses a command line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line {
            "CONNECT" => Self::Connect,
            "CONNECTED" => Self::Connected,
            "SUBSCRIBE" => Self::Subscribe,
            "MESSAGE" => Self::Message,
            "SEND" => Self::Send,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FrameCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Frame
// ============================================================================

/// One command + headers + body unit of the wire protocol.
///
/// Headers keep their wire order; lookups return the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command line.
    pub command: FrameCommand,
    /// Header block as `(key, value)` pairs.
    pub headers: Vec<(String, String)>,
    /// Raw body text.
    pub body: String,
}

impl Frame {
    /// Creates a frame without headers or body.
    #[inline]
    #[must_use]
    pub fn new(command: FrameCommand) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Appends a header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Sets the body.
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the client handshake frame.
    #[must_use]
    pub fn connect(accept_version: &str, heart_beat: &str) -> Self {
        Self::new(FrameCommand::Connect)
            .with_header(HEADER_ACCEPT_VERSION, accept_version)
            .with_header(HEADER_HEART_BEAT, heart_beat)
    }

    /// Builds a subscription frame.
    #[must_use]
    pub fn subscribe(id: SubscriptionId, destination: &str) -> Self {
        Self::new(FrameCommand::Subscribe)
            .with_header(HEADER_ID, id.to_string())
            .with_header(HEADER_DESTINATION, destination)
    }

    /// Builds a publish frame with an empty body.
    #[must_use]
    pub fn send(destination: &str) -> Self {
        Self::new(FrameCommand::Send).with_header(HEADER_DESTINATION, destination)
    }

    /// Returns the first value of a header.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the `destination` header.
    #[inline]
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.header(HEADER_DESTINATION)
    }

    /// Encodes the frame for the wire.
    #[must_use]
    pub fn encode(&self) -> String {
        let header_len: usize = self
            .headers
            .iter()
            .map(|(k, v)| k.len() + v.len() + 2)
            .sum();
        let mut out = String::with_capacity(
            self.command.as_str().len() + header_len + self.body.len() + 3,
        );

        out.push_str(self.command.as_str());
        out.push('\n');
        for (key, value) in &self.headers {
            out.push_str(key);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push(NUL);
        out
    }

    /// Decodes a frame from wire text. Never fails.
    #[must_use]
    pub fn decode(text: &str) -> Self {
        let mut lines = text.split('\n');

        let command = FrameCommand::parse(
            lines
                .next()
                .unwrap_or_default()
                .trim_end_matches(['\r', NUL]),
        );

        let mut headers = Vec::new();
        let mut found_boundary = false;
        for line in lines.by_ref() {
            let line = line.trim_end_matches(['\r', NUL]);
            if line.is_empty() {
                found_boundary = true;
                break;
            }
            // Lines without a separator are ignored
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.to_string(), value.to_string()));
            }
        }

        let body = if found_boundary {
            let rest: Vec<&str> = lines.collect();
            strip_terminator(&rest.join("\n")).to_string()
        } else {
            String::new()
        };

        Self {
            command,
            headers,
            body,
        }
    }
}

/// Drops the NUL terminator and any end-of-line padding after it.
fn strip_terminator(body: &str) -> &str {
    match body.rfind(NUL) {
        Some(idx) if body[idx + 1..].chars().all(|c| c == '\n' || c == '\r') => &body[..idx],
        _ => body,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_encode_connect() {
        let frame = Frame::connect("1.2", "10000,10000");
        assert_eq!(
            frame.encode(),
            "CONNECT\naccept-version:1.2\nheart-beat:10000,10000\n\n\0"
        );
    }

    #[test]
    fn test_encode_subscribe() {
        let frame = Frame::subscribe(SubscriptionId::new(0), "/topic/room/ABC123/game");
        assert_eq!(
            frame.encode(),
            "SUBSCRIBE\nid:sub-0\ndestination:/topic/room/ABC123/game\n\n\0"
        );
    }

    #[test]
    fn test_decode_message() {
        let text = "MESSAGE\ndestination:/topic/room/ABC123/game\nmessage-id:7\n\n{\"a\":1}\0";
        let frame = Frame::decode(text);

        assert_eq!(frame.command, FrameCommand::Message);
        assert_eq!(frame.destination(), Some("/topic/room/ABC123/game"));
        assert_eq!(frame.header("message-id"), Some("7"));
        assert_eq!(frame.body, "{\"a\":1}");
    }

    #[test]
    fn test_decode_body_with_blank_lines() {
        let text = "MESSAGE\ndestination:/x\n\nline one\n\nline three\0";
        let frame = Frame::decode(text);
        assert_eq!(frame.body, "line one\n\nline three");
    }

    #[test]
    fn test_decode_header_value_with_colon() {
        let frame = Frame::decode("CONNECTED\nserver:broker:1.0\n\n\0");
        assert_eq!(frame.command, FrameCommand::Connected);
        assert_eq!(frame.header("server"), Some("broker:1.0"));
    }

    #[test]
    fn test_decode_ignores_malformed_header() {
        let frame = Frame::decode("MESSAGE\ngarbage line\ndestination:/x\n\nbody\0");
        assert_eq!(frame.headers.len(), 1);
        assert_eq!(frame.destination(), Some("/x"));
        assert_eq!(frame.body, "body");
    }

    #[test]
    fn test_decode_without_boundary() {
        let frame = Frame::decode("MESSAGE\ndestination:/x");
        assert_eq!(frame.command, FrameCommand::Message);
        assert_eq!(frame.destination(), Some("/x"));
        assert!(frame.body.is_empty());
    }

    #[test]
    fn test_decode_strips_trailing_eol_after_terminator() {
        let frame = Frame::decode("MESSAGE\n\nbody\0\n");
        assert_eq!(frame.body, "body");
    }

    #[test]
    fn test_decode_crlf() {
        let frame = Frame::decode("CONNECTED\r\nversion:1.2\r\n\r\n\0");
        assert_eq!(frame.command, FrameCommand::Connected);
        assert_eq!(frame.header("version"), Some("1.2"));
    }

    #[test]
    fn test_decode_heartbeat_eol() {
        let frame = Frame::decode("\n");
        assert_eq!(frame.command, FrameCommand::Other(String::new()));
        assert!(frame.headers.is_empty());
    }

    #[test]
    fn test_unknown_command_preserved() {
        let frame = Frame::decode("ERROR\nmessage:boom\n\n\0");
        assert_eq!(frame.command, FrameCommand::Other("ERROR".into()));
        assert_eq!(frame.command.to_string(), "ERROR");
    }

    fn command_strategy() -> impl Strategy<Value = FrameCommand> {
        prop_oneof![
            Just(FrameCommand::Connect),
            Just(FrameCommand::Connected),
            Just(FrameCommand::Subscribe),
            Just(FrameCommand::Message),
            Just(FrameCommand::Send),
        ]
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            command in command_strategy(),
            headers in prop::collection::vec(("[a-z][a-z-]{0,12}", "[^\n\r\0]{0,24}"), 0..6),
            body in "[^\0]{0,64}",
        ) {
            let frame = Frame { command, headers, body };
            prop_assert_eq!(Frame::decode(&frame.encode()), frame);
        }
    }
}
