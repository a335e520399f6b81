//! Speech-model backend wire protocol
//!
//! Message-framed JSON on the realtime WebSocket. Commands go out, events
//! come in; both are closed tagged enums so the relay loop matches
//! exhaustively. Unknown inbound kinds land on [`ModelEvent::Unknown`].

use serde::{Deserialize, Serialize};

use frontdesk_core::VoiceType;

/// Commands sent to the model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModelCommand {
    /// Configure the realtime session before any audio flows
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },

    /// Forward one base64 audio payload from the caller
    #[serde(rename = "input_audio_buffer.append")]
    AppendAudio { audio: String },

    /// Cut off an in-flight spoken response at the given offset
    #[serde(rename = "conversation.item.truncate")]
    TruncateItem {
        item_id: String,
        content_index: u32,
        audio_end_ms: u64,
    },
}

/// Realtime session configuration carried by `session.update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub turn_detection: TurnDetection,
    pub input_audio_format: String,
    pub output_audio_format: String,
    pub input_audio_transcription: TranscriptionConfig,
    pub voice: String,
    pub instructions: String,
    pub modalities: Vec<String>,
    pub temperature: f64,
}

impl SessionConfig {
    /// Telephony-bridged session: G.711 mu-law both ways, server VAD with
    /// interruption, text and audio modalities.
    pub fn realtime(voice: VoiceType, instructions: impl Into<String>) -> Self {
        Self {
            turn_detection: TurnDetection::server_vad(),
            input_audio_format: "g711_ulaw".to_string(),
            output_audio_format: "g711_ulaw".to_string(),
            input_audio_transcription: TranscriptionConfig::default(),
            voice: voice.model_voice().to_string(),
            instructions: instructions.into(),
            modalities: vec!["text".to_string(), "audio".to_string()],
            temperature: 0.7,
        }
    }
}

/// Server-side voice activity detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: String,
    pub threshold: f64,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
    pub create_response: bool,
    pub interrupt_response: bool,
}

impl TurnDetection {
    pub fn server_vad() -> Self {
        Self {
            kind: "server_vad".to_string(),
            threshold: 0.5,
            prefix_padding_ms: 100,
            silence_duration_ms: 200,
            create_response: true,
            interrupt_response: true,
        }
    }
}

/// Input transcription model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub model: String,
    pub language: String,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: "en".to_string(),
        }
    }
}

/// Events received from the model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModelEvent {
    /// Session configured, waiting for the caller to speak
    #[serde(rename = "session.ready")]
    SessionReady,

    /// The caller started talking over the assistant
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        item_id: String,
        #[serde(default)]
        audio_start_ms: u64,
    },

    /// Final user transcript for the turn
    #[serde(rename = "input_audio_buffer.speech_final")]
    SpeechFinal {
        #[serde(default)]
        text: Option<String>,
    },

    /// Transcription of the caller's buffered audio
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        #[serde(default)]
        transcript: Option<String>,
    },

    /// One base64 chunk of spoken assistant audio
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        #[serde(default)]
        delta: Option<String>,
    },

    /// One incremental chunk of assistant text
    #[serde(rename = "response.content.delta")]
    ContentDelta {
        #[serde(default)]
        delta: Option<String>,
    },

    /// The assistant's turn is complete
    #[serde(rename = "response.done")]
    ResponseDone,

    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        error: serde_json::Value,
    },

    #[serde(other)]
    Unknown,
}
