//! Live call bridge
//!
//! Per-call relay between a telephony media stream and a realtime speech
//! model: turn-taking and barge-in handling, structured booking extraction
//! from completed assistant turns, transcript recording and at-most-once
//! booking persistence, plus the registry that tracks live calls.

pub mod handler;
pub mod registry;
pub mod turn;

pub use handler::{CallContext, CallHandler, CallOutcome};
pub use registry::{CallGuard, CallInfo, CallRegistry};
pub use turn::{TurnState, TurnTracker};

use thiserror::Error;

use frontdesk_persistence::PersistenceError;
use frontdesk_transport::TransportError;

/// Bridge errors
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Booking error: {0}")]
    Booking(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Idle timeout elapsed")]
    IdleTimeout,

    #[error("Session error: {0}")]
    Session(String),
}

impl From<BridgeError> for frontdesk_core::Error {
    fn from(err: BridgeError) -> Self {
        frontdesk_core::Error::Session(err.to_string())
    }
}
