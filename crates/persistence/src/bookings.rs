//! Booking record storage

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use uuid::Uuid;

use frontdesk_booking::slot_label;
use frontdesk_core::BookingRecord;

use crate::PersistenceError;

/// Booking store trait for abstraction
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist one booking. A second booking for the same assistant,
    /// date and slot is rejected.
    async fn persist_booking(&self, record: BookingRecord) -> Result<Uuid, PersistenceError>;

    /// Bookings for one assistant on one date, keyed by slot label
    async fn booked_slots(
        &self,
        assistant_id: Uuid,
        date: NaiveDate,
    ) -> Result<HashMap<String, BookingRecord>, PersistenceError>;
}

/// In-memory implementation of the booking store
#[derive(Clone, Default)]
pub struct InMemoryBookings {
    records: Arc<RwLock<Vec<BookingRecord>>>,
}

impl InMemoryBookings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookings {
    async fn persist_booking(&self, record: BookingRecord) -> Result<Uuid, PersistenceError> {
        let label = slot_label(record.time);
        let mut records = self.records.write();

        let taken = records.iter().any(|existing| {
            existing.assistant_id == record.assistant_id
                && existing.date == record.date
                && slot_label(existing.time) == label
        });
        if taken {
            return Err(PersistenceError::Rejected(format!(
                "slot {} on {} is already booked",
                label, record.date
            )));
        }

        let id = record.id;
        tracing::info!(
            booking_id = %id,
            assistant_id = %record.assistant_id,
            date = %record.date,
            slot = %label,
            "booking persisted"
        );
        records.push(record);
        Ok(id)
    }

    async fn booked_slots(
        &self,
        assistant_id: Uuid,
        date: NaiveDate,
    ) -> Result<HashMap<String, BookingRecord>, PersistenceError> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| r.assistant_id == assistant_id && r.date == date)
            .map(|r| (slot_label(r.time), r.clone()))
            .collect())
    }
}
