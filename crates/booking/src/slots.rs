//! Deterministic slot-availability calculation
//!
//! Slots are identified by their pretty 12-hour start label ("9:00 AM");
//! the booking store keys its booked-slot map by the same label.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use thiserror::Error;

use frontdesk_core::{AssistantProfile, BookingDraft, BookingRecord, WeekdayMap};

/// Errors raised for unusable profile data
#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid time of day: {0:?}")]
    InvalidTime(String),

    #[error("Invalid slot duration: {0} minutes")]
    InvalidDuration(u32),
}

/// One bookable slot on a given date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilitySlot {
    /// Pretty 12-hour start label, e.g. "9:00 AM"
    pub label: String,
    pub duration_minutes: u32,
    pub booked: bool,
}

/// Pretty 12-hour label for a slot start, leading zero stripped
pub fn slot_label(time: NaiveTime) -> String {
    let formatted = time.format("%I:%M %p").to_string();
    formatted.trim_start_matches('0').to_string()
}

fn parse_hhmm(input: &str) -> Result<NaiveTime, SlotError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map_err(|_| SlotError::InvalidTime(input.to_string()))
}

/// Generate the ordered slot-start labels for one calendar date.
///
/// Returns an empty list when the weekday is closed. Walks from
/// `start_time` to `end_time` in `duration_minutes` steps, emitting a
/// label for every slot whose start is strictly before `end_time`.
/// `available_days == None` means the default Monday-Friday week.
pub fn generate_slots(
    start_time: &str,
    end_time: &str,
    duration_minutes: u32,
    available_days: Option<&WeekdayMap>,
    for_date: NaiveDate,
) -> Result<Vec<String>, SlotError> {
    if duration_minutes == 0 {
        return Err(SlotError::InvalidDuration(duration_minutes));
    }

    let default_days;
    let days = match available_days {
        Some(days) => days,
        None => {
            default_days = WeekdayMap::weekdays();
            &default_days
        }
    };
    if !days.is_open(for_date.weekday()) {
        return Ok(Vec::new());
    }

    let start = parse_hhmm(start_time)?;
    let end = parse_hhmm(end_time)?;
    let step = chrono::Duration::minutes(i64::from(duration_minutes));

    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        slots.push(slot_label(current));
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            // stepping past midnight ends the walk
            break;
        }
        current = next;
    }
    Ok(slots)
}

/// Today's slots for a profile, each marked booked or free against the
/// store-supplied booked-slot map. Consumed by the instruction builder
/// and by draft validation.
pub fn availability(
    profile: &AssistantProfile,
    booked: &HashMap<String, BookingRecord>,
    for_date: NaiveDate,
) -> Result<Vec<AvailabilitySlot>, SlotError> {
    let labels = generate_slots(
        &profile.start_time,
        &profile.end_time,
        profile.slot_minutes,
        profile.available_days.as_ref(),
        for_date,
    )?;

    Ok(labels
        .into_iter()
        .map(|label| {
            let is_booked = booked.contains_key(&label);
            AvailabilitySlot {
                label,
                duration_minutes: profile.slot_minutes,
                booked: is_booked,
            }
        })
        .collect())
}

/// Check that a draft lands on a generated, unbooked slot for its date
pub fn slot_available(
    profile: &AssistantProfile,
    booked: &HashMap<String, BookingRecord>,
    draft: &BookingDraft,
) -> Result<bool, SlotError> {
    let labels = generate_slots(
        &profile.start_time,
        &profile.end_time,
        profile.slot_minutes,
        profile.available_days.as_ref(),
        draft.date,
    )?;
    let label = slot_label(draft.time);
    Ok(labels.contains(&label) && !booked.contains_key(&label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_core::BookingRecord;
    use uuid::Uuid;

    fn monday() -> NaiveDate {
        // 2024-05-06 is a Monday
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()
    }

    #[test]
    fn test_slot_walk() {
        let slots = generate_slots("09:00", "17:00", 30, None, monday()).unwrap();
        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0], "9:00 AM");
        assert_eq!(slots[1], "9:30 AM");
        assert_eq!(slots[2], "10:00 AM");
        assert_eq!(slots.last().unwrap(), "4:30 PM");
    }

    #[test]
    fn test_no_slot_starts_at_or_after_close() {
        let slots = generate_slots("09:00", "10:15", 30, None, monday()).unwrap();
        assert_eq!(slots, vec!["9:00 AM", "9:30 AM", "10:00 AM"]);
    }

    #[test]
    fn test_closed_weekday_is_empty() {
        let slots = generate_slots("09:00", "17:00", 30, None, saturday()).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_explicit_days_override_default() {
        let mut days = WeekdayMap::weekdays();
        days.set(chrono::Weekday::Sat, true);
        let slots = generate_slots("09:00", "10:00", 30, Some(&days), saturday()).unwrap();
        assert_eq!(slots, vec!["9:00 AM", "9:30 AM"]);
    }

    #[test]
    fn test_invalid_inputs_error() {
        assert!(generate_slots("9am", "17:00", 30, None, monday()).is_err());
        assert!(generate_slots("09:00", "17:00", 0, None, monday()).is_err());
    }

    #[test]
    fn test_availability_marks_booked() {
        let profile = AssistantProfile::new("Mia", "Sunrise Dental").hours("09:00", "10:30");
        let draft = BookingDraft {
            date: monday(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            customer_name: "Ana".to_string(),
            details: String::new(),
        };
        let record = BookingRecord::from_draft(Uuid::new_v4(), draft);
        let mut booked = HashMap::new();
        booked.insert(slot_label(record.time), record);

        let slots = availability(&profile, &booked, monday()).unwrap();
        assert_eq!(slots.len(), 3);
        assert!(!slots[0].booked);
        assert!(slots[1].booked);
        assert_eq!(slots[1].label, "9:30 AM");
    }

    #[test]
    fn test_slot_available_rejects_taken_and_off_grid() {
        let profile = AssistantProfile::new("Mia", "Sunrise Dental").hours("09:00", "17:00");
        let mut booked = HashMap::new();

        let on_grid = BookingDraft {
            date: monday(),
            time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            customer_name: "Ana".to_string(),
            details: String::new(),
        };
        assert!(slot_available(&profile, &booked, &on_grid).unwrap());

        let record = BookingRecord::from_draft(Uuid::new_v4(), on_grid.clone());
        booked.insert(slot_label(record.time), record);
        assert!(!slot_available(&profile, &booked, &on_grid).unwrap());

        let off_grid = BookingDraft {
            time: NaiveTime::from_hms_opt(14, 10, 0).unwrap(),
            ..on_grid
        };
        assert!(!slot_available(&profile, &booked, &off_grid).unwrap());
    }
}
