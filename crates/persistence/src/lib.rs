//! Persistence layer for the call bridge
//!
//! Storage for:
//! - Conversation transcripts
//! - Booking records (at-most-once per slot)
//! - Assistant profiles
//!
//! The bridge works against the store traits; the in-memory
//! implementations back tests and single-process deployments.

pub mod bookings;
pub mod error;
pub mod profiles;
pub mod transcripts;

pub use bookings::{BookingStore, InMemoryBookings};
pub use error::PersistenceError;
pub use profiles::{InMemoryProfiles, ProfileStore};
pub use transcripts::{InMemoryTranscripts, TranscriptStore};

use std::sync::Arc;

/// Combined persistence layer with all stores
#[derive(Clone)]
pub struct PersistenceLayer {
    pub transcripts: Arc<dyn TranscriptStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub profiles: Arc<dyn ProfileStore>,
}

/// Initialize an in-memory persistence layer
pub fn in_memory() -> PersistenceLayer {
    PersistenceLayer {
        transcripts: Arc::new(InMemoryTranscripts::new()),
        bookings: Arc::new(InMemoryBookings::new()),
        profiles: Arc::new(InMemoryProfiles::new()),
    }
}
