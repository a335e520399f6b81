//! Telephony media-stream wire protocol
//!
//! Message-framed JSON events on the carrier's media-stream WebSocket.
//! Audio payloads are base64 G.711 mu-law at 8 kHz and are forwarded
//! opaquely; this module never transcodes them.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::TransportError;

/// Inbound events from the telephony side.
///
/// Event kinds outside the protocol deserialize to [`TelephonyEvent::Unknown`]
/// so the relay loop handles them as a visible default arm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelephonyEvent {
    /// Connection preamble, carries no stream identifier yet
    Connected,
    Start { start: StreamStart },
    Media { media: MediaPayload },
    Stop,
    #[serde(other)]
    Unknown,
}

/// Stream identification carried by the "start" event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStart {
    #[serde(rename = "streamSid")]
    pub stream_sid: String,

    #[serde(rename = "callSid", default, skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
}

/// Base64-encoded audio payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub payload: String,
}

impl MediaPayload {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Decode the payload, rejecting frames that are not valid base64
    pub fn decode(&self) -> Result<Vec<u8>, TransportError> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.payload)
            .map_err(|e| TransportError::Malformed(format!("media payload: {e}")))
    }
}

/// Outbound frames to the telephony side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelephonyOutbound {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: MediaPayload,
    },
    /// Flush buffered playback immediately
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl TelephonyOutbound {
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::Media {
            stream_sid: stream_sid.into(),
            media: MediaPayload::new(payload),
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        Self::Clear {
            stream_sid: stream_sid.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_event() {
        let raw = r#"{"event":"start","sequenceNumber":"1","start":{"streamSid":"MZ123","callSid":"CA456","tracks":["inbound"]}}"#;
        let event: TelephonyEvent = serde_json::from_str(raw).unwrap();
        match event {
            TelephonyEvent::Start { start } => {
                assert_eq!(start.stream_sid, "MZ123");
                assert_eq!(start.call_sid.as_deref(), Some("CA456"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_parse_media_event() {
        let raw = r#"{"event":"media","media":{"payload":"AAAA"}}"#;
        let event: TelephonyEvent = serde_json::from_str(raw).unwrap();
        match event {
            TelephonyEvent::Media { media } => {
                assert_eq!(media.payload, "AAAA");
                assert_eq!(media.decode().unwrap(), vec![0, 0, 0]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_kind() {
        let raw = r#"{"event":"mark","mark":{"name":"x"}}"#;
        let event: TelephonyEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event, TelephonyEvent::Unknown);
    }

    #[test]
    fn test_clear_frame_shape() {
        let json = serde_json::to_value(TelephonyOutbound::clear("MZ123")).unwrap();
        assert_eq!(json["event"], "clear");
        assert_eq!(json["streamSid"], "MZ123");
    }

    #[test]
    fn test_media_frame_shape() {
        let json = serde_json::to_value(TelephonyOutbound::media("MZ123", "AAAA")).unwrap();
        assert_eq!(json["event"], "media");
        assert_eq!(json["streamSid"], "MZ123");
        assert_eq!(json["media"]["payload"], "AAAA");
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let media = MediaPayload::new("not base64!!!");
        assert!(media.decode().is_err());
    }
}
