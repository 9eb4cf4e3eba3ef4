//! Wire messages for the WebSocket synthesis protocol.

use serde::{Deserialize, Serialize};

/// Generic message with just a type field, used for initial parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericMessage {
    /// The message type.
    #[serde(rename = "type")]
    pub msg_type: String,
}

/// Setup message sent to initialize a synthesis session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupMessage {
    /// The message type (always "setup").
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Voice name to use for synthesis.
    pub voice: String,
    /// Requested audio output format.
    pub output_format: String,
}

impl SetupMessage {
    /// Creates a new setup message.
    pub fn new(voice: String, output_format: String) -> Self {
        Self {
            msg_type: "setup".to_string(),
            voice,
            output_format,
        }
    }
}

/// Ready message received when the server has accepted the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyMessage {
    /// The message type (always "ready").
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Request ID assigned by the server for this session.
    pub request_id: String,
}

/// Text message carrying the text to synthesize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextMessage {
    /// The message type (always "text").
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Text to synthesize.
    pub text: String,
}

impl TextMessage {
    /// Creates a new text message.
    pub fn new(text: String) -> Self {
        Self {
            msg_type: "text".to_string(),
            text,
        }
    }
}

/// Audio message received containing one chunk of synthesized audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMessage {
    /// The message type (always "audio").
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Base64-encoded PCM audio data.
    pub audio: String,
}

/// End of stream message, sent after the last text and received as the
/// terminal success marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EosMessage {
    /// The message type (always "end_of_stream").
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl EosMessage {
    /// Creates a new end of stream message.
    pub fn new() -> Self {
        Self {
            msg_type: "end_of_stream".to_string(),
        }
    }
}

impl Default for EosMessage {
    fn default() -> Self {
        Self::new()
    }
}

/// Error message from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// The message type (always "error").
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Error message.
    pub message: String,
    /// HTTP-style error code.
    pub code: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_message_serialization() {
        let msg = SetupMessage::new("voice-1".to_string(), "pcm_16000".to_string());
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"setup""#));
        assert!(json.contains(r#""voice":"voice-1""#));
        assert!(json.contains(r#""output_format":"pcm_16000""#));
    }

    #[test]
    fn test_audio_message_deserialization() {
        let json = r#"{"type":"audio","audio":"AAAA"}"#;
        let generic: GenericMessage = serde_json::from_str(json).unwrap();
        assert_eq!(generic.msg_type, "audio");
        let msg: AudioMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.audio, "AAAA");
    }

    #[test]
    fn test_error_message_deserialization() {
        let json = r#"{"type":"error","message":"bad voice","code":400}"#;
        let msg: ErrorMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.message, "bad voice");
        assert_eq!(msg.code, 400);
    }
}
