//! Booking drafts and persisted records

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A structured appointment request parsed out of assistant output.
///
/// Transient: a draft only becomes a [`BookingRecord`] after it has been
/// validated against availability and accepted by the booking store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub customer_name: String,
    pub details: String,
}

/// A persisted appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    pub assistant_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub customer_name: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn from_draft(assistant_id: Uuid, draft: BookingDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            assistant_id,
            date: draft.date,
            time: draft.time,
            customer_name: draft.customer_name,
            details: draft.details,
            created_at: Utc::now(),
        }
    }
}
