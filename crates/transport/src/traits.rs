//! Channel traits at the relay seams
//!
//! The bridge works against these interfaces; production wires them to
//! the carrier's WebSocket (server side) and the model backend client,
//! tests wire them to in-process channel pairs.

use async_trait::async_trait;

use crate::model::{ModelCommand, ModelEvent};
use crate::telephony::{TelephonyEvent, TelephonyOutbound};
use crate::TransportError;

/// Receiving half of the telephony media stream
#[async_trait]
pub trait TelephonyStream: Send {
    /// Next inbound event; `Ok(None)` when the peer closed the stream.
    ///
    /// Implementations skip frames that do not deserialize, logging them;
    /// a skipped frame never surfaces here.
    async fn next_event(&mut self) -> Result<Option<TelephonyEvent>, TransportError>;
}

/// Sending half of the telephony media stream
#[async_trait]
pub trait TelephonySink: Send {
    async fn send(&mut self, frame: TelephonyOutbound) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Receiving half of the model backend channel
#[async_trait]
pub trait ModelStream: Send {
    /// Next inbound event; `Ok(None)` when the backend closed the stream
    async fn next_event(&mut self) -> Result<Option<ModelEvent>, TransportError>;
}

/// Sending half of the model backend channel
#[async_trait]
pub trait ModelSink: Send {
    async fn send(&mut self, command: ModelCommand) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}
