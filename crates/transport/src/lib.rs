//! Transport layer for the call bridge
//!
//! Wire protocol for both relay channels plus the trait seams the bridge
//! runs against:
//! - telephony media-stream events (carrier side)
//! - realtime model backend commands and events
//! - the outbound WebSocket client for the model backend
//! - in-process channel transports for tests and socket pumps

pub mod channel;
pub mod client;
pub mod model;
pub mod telephony;
pub mod traits;

pub use channel::{model_channel, telephony_channel};
pub use client::{connect, ModelBackendConfig, ModelClientSink, ModelClientStream};
pub use model::{ModelCommand, ModelEvent, SessionConfig, TranscriptionConfig, TurnDetection};
pub use telephony::{MediaPayload, StreamStart, TelephonyEvent, TelephonyOutbound};
pub use traits::{ModelSink, ModelStream, TelephonySink, TelephonyStream};

use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Channel closed")]
    Closed,

    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<TransportError> for frontdesk_core::Error {
    fn from(err: TransportError) -> Self {
        frontdesk_core::Error::Transport(err.to_string())
    }
}
