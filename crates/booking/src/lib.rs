//! Booking domain logic
//!
//! Deterministic slot-availability calculation, structured booking-block
//! extraction from completed assistant turns, and the instruction builder
//! that seeds the speech model's context. Everything here is pure; I/O
//! lives with the callers.

pub mod extract;
pub mod prompt;
pub mod slots;

pub use extract::{extract, ExtractError, TurnAccumulator};
pub use prompt::instructions;
pub use slots::{
    availability, generate_slots, slot_available, slot_label, AvailabilitySlot, SlotError,
};

impl From<SlotError> for frontdesk_core::Error {
    fn from(err: SlotError) -> Self {
        frontdesk_core::Error::Booking(err.to_string())
    }
}

impl From<ExtractError> for frontdesk_core::Error {
    fn from(err: ExtractError) -> Self {
        frontdesk_core::Error::Booking(err.to_string())
    }
}
