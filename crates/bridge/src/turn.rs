//! Turn and interruption state machine
//!
//! Tracks one call's relay lifecycle. Transitions are driven solely by
//! relay events; repeated terminal events are accepted and ignored.

/// Relay lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TurnState {
    /// Created, relay not started
    Init,
    /// Greeting sent, waiting for the carrier's start frame
    AwaitingStreamId,
    /// Bidirectional audio flowing
    Active,
    /// Caller barge-in being handled
    Interrupted,
    /// Booking persist in flight
    Finalizing,
    /// Terminal; no further audio or text is processed
    Closed,
}

/// Per-call state tracker
///
/// Owned by the orchestrator loop; the inbound relay task only reads it.
#[derive(Debug)]
pub struct TurnTracker {
    state: TurnState,
    stream_sid: Option<String>,
    audio_suppressed: bool,
}

impl TurnTracker {
    pub fn new() -> Self {
        Self {
            state: TurnState::Init,
            stream_sid: None,
            audio_suppressed: false,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    pub fn audio_suppressed(&self) -> bool {
        self.audio_suppressed
    }

    /// Relay started: the session config has been sent to the model
    pub fn begin_relay(&mut self) -> bool {
        if self.state == TurnState::Init {
            self.state = TurnState::AwaitingStreamId;
            true
        } else {
            false
        }
    }

    /// Carrier start frame arrived with its stream id
    pub fn stream_started(&mut self, stream_sid: impl Into<String>) -> bool {
        if self.state == TurnState::AwaitingStreamId {
            self.stream_sid = Some(stream_sid.into());
            self.state = TurnState::Active;
            true
        } else {
            false
        }
    }

    /// Caller started speaking over assistant audio
    pub fn interrupt(&mut self) -> bool {
        if self.state == TurnState::Active {
            self.state = TurnState::Interrupted;
            true
        } else {
            false
        }
    }

    /// Barge-in handled, back to normal relay
    pub fn resume(&mut self) -> bool {
        if self.state == TurnState::Interrupted {
            self.state = TurnState::Active;
            true
        } else {
            false
        }
    }

    /// Stop forwarding model audio for the rest of the current turn.
    /// Returns true only on the first call per turn.
    pub fn suppress_audio(&mut self) -> bool {
        if self.audio_suppressed || self.state >= TurnState::Finalizing {
            false
        } else {
            self.audio_suppressed = true;
            true
        }
    }

    /// A completed turn has been fully processed; the next turn starts clean
    pub fn turn_completed(&mut self) {
        self.audio_suppressed = false;
    }

    /// A validated booking is about to be persisted.
    /// The transition happens before the store await, so a second draft in
    /// the same session can never reach the store.
    pub fn finalize(&mut self) -> bool {
        if matches!(self.state, TurnState::Active | TurnState::Interrupted) {
            self.state = TurnState::Finalizing;
            true
        } else {
            false
        }
    }

    /// Terminal transition, idempotent
    pub fn close(&mut self) -> bool {
        if self.state == TurnState::Closed {
            false
        } else {
            self.state = TurnState::Closed;
            true
        }
    }

    /// Inbound caller media is forwarded to the model in these states
    pub fn accepts_media(&self) -> bool {
        matches!(self.state, TurnState::Active | TurnState::Interrupted)
    }

    /// Model audio is forwarded to the carrier only here
    pub fn forwards_model_audio(&self) -> bool {
        self.state == TurnState::Active && !self.audio_suppressed
    }
}

impl Default for TurnTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut tracker = TurnTracker::new();
        assert_eq!(tracker.state(), TurnState::Init);
        assert!(!tracker.accepts_media());

        assert!(tracker.begin_relay());
        assert!(tracker.stream_started("MZ123"));
        assert_eq!(tracker.stream_sid(), Some("MZ123"));
        assert!(tracker.accepts_media());
        assert!(tracker.forwards_model_audio());

        assert!(tracker.finalize());
        assert_eq!(tracker.state(), TurnState::Finalizing);
        assert!(tracker.close());
        assert_eq!(tracker.state(), TurnState::Closed);
    }

    #[test]
    fn test_interrupt_round_trip() {
        let mut tracker = TurnTracker::new();
        tracker.begin_relay();
        tracker.stream_started("MZ123");

        assert!(tracker.interrupt());
        assert!(!tracker.forwards_model_audio());
        assert!(tracker.accepts_media());
        assert!(tracker.resume());
        assert!(tracker.forwards_model_audio());
    }

    #[test]
    fn test_interrupt_requires_active() {
        let mut tracker = TurnTracker::new();
        assert!(!tracker.interrupt());
        tracker.begin_relay();
        assert!(!tracker.interrupt());
    }

    #[test]
    fn test_suppression_reports_once_and_resets_on_new_turn() {
        let mut tracker = TurnTracker::new();
        tracker.begin_relay();
        tracker.stream_started("MZ123");

        assert!(tracker.suppress_audio());
        assert!(!tracker.suppress_audio());
        assert!(!tracker.forwards_model_audio());

        tracker.turn_completed();
        assert!(tracker.forwards_model_audio());
        assert!(tracker.suppress_audio());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut tracker = TurnTracker::new();
        tracker.begin_relay();
        assert!(tracker.close());
        assert!(!tracker.close());
        assert!(!tracker.stream_started("MZ123"));
        assert!(!tracker.finalize());
        assert!(!tracker.accepts_media());
    }

    #[test]
    fn test_finalizing_blocks_second_booking() {
        let mut tracker = TurnTracker::new();
        tracker.begin_relay();
        tracker.stream_started("MZ123");
        assert!(tracker.finalize());
        assert!(!tracker.finalize());
        assert!(!tracker.suppress_audio());
    }
}
