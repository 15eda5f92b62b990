use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Language selection made by the client at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    /// Detect the spoken language from transcripts.
    Auto,
    /// Use a fixed language tag for every request.
    Fixed(String),
}

impl LanguageMode {
    pub fn is_auto(&self) -> bool {
        matches!(self, LanguageMode::Auto)
    }
}

/// Inbound events delivered to a session's mailbox.
///
/// The transport layer translates its own messages into these; within one
/// session they are processed strictly in arrival order.
#[derive(Debug)]
pub enum SessionEvent {
    /// Raw PCM bytes from the client microphone.
    Audio(Vec<u8>),
    /// Explicit stop request; triggers the final flush.
    Stop,
    /// Connection dropped without a stop; treated like a stop.
    Disconnect,
}

/// Outbound events delivered back to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Emitted once after session creation.
    Ready {
        session_id: String,
        language: String,
        auto_detect: bool,
    },

    /// Emitted at most once per session, when detection locks.
    LanguageDetected {
        language: String,
        language_name: String,
        confidence: f64,
    },

    InterimTranscript {
        text: String,
        language: String,
        timestamp: DateTime<Utc>,
    },

    FinalTranscript {
        text: String,
        language: String,
        timestamp: DateTime<Utc>,
    },

    Error {
        message: String,
    },

    /// Emitted after the final flush completes; always the last event.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kebab_case_tags() {
        let event = ClientEvent::LanguageDetected {
            language: "hi-IN".to_string(),
            language_name: "Hindi (हिंदी)".to_string(),
            confidence: 0.95,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "language-detected");
        assert_eq!(json["language"], "hi-IN");

        let json = serde_json::to_value(ClientEvent::Stopped).unwrap();
        assert_eq!(json["event"], "stopped");
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = ClientEvent::InterimTranscript {
            text: "hello there".to_string(),
            language: "en-IN".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: ClientEvent = serde_json::from_str(&json).unwrap();
        match back {
            ClientEvent::InterimTranscript { text, language, .. } => {
                assert_eq!(text, "hello there");
                assert_eq!(language, "en-IN");
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }
}
