//! Structured booking-block extraction
//!
//! A confirmed booking arrives embedded in the assistant's reply as a
//! fenced ```json block carrying a `booking_confirmed` object. An older
//! `[BOOKING: {...}]` bracket tag is still accepted on input, never
//! emitted. Extraction runs once per completed turn over the full
//! accumulated text.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use frontdesk_core::BookingDraft;

const JSON_FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";
const LEGACY_TAG: &str = "[BOOKING:";

/// Errors for a block that was found but carries unusable fields
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unparseable booking time: {0:?}")]
    Time(String),

    #[error("Unparseable booking date: {0:?}")]
    Date(String),
}

/// Scan a completed reply for a structured booking block.
///
/// Returns the reply with the block stripped and trimmed, plus the parsed
/// draft when a `booking_confirmed` object with a `time` field is present.
/// No block, or a block that is not valid JSON, is the common case: the
/// text comes back unchanged with no draft. A block whose `time` or `date`
/// cannot be parsed is an error; the caller discards the draft and the
/// conversation continues.
pub fn extract(
    text: &str,
    today: NaiveDate,
) -> Result<(String, Option<BookingDraft>), ExtractError> {
    if let Some((cleaned, raw)) = split_fenced_block(text) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
            return finish(cleaned, value, today);
        }
        return Ok((text.to_string(), None));
    }

    if let Some((cleaned, raw)) = split_legacy_block(text) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
            return finish(cleaned, value, today);
        }
        return Ok((text.to_string(), None));
    }

    Ok((text.to_string(), None))
}

fn finish(
    cleaned: String,
    value: serde_json::Value,
    today: NaiveDate,
) -> Result<(String, Option<BookingDraft>), ExtractError> {
    let confirmed = value.get("booking_confirmed").and_then(|v| v.as_object());
    let Some(fields) = confirmed else {
        // valid JSON but not a booking; strip the block, nothing to book
        return Ok((cleaned, None));
    };
    let Some(raw_time) = fields.get("time").and_then(|v| v.as_str()) else {
        return Ok((cleaned, None));
    };

    let time = parse_time(raw_time)?;
    let date = match fields.get("date").and_then(|v| v.as_str()) {
        Some(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| ExtractError::Date(raw.to_string()))?,
        _ => today,
    };
    let customer_name = fields
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let details = fields
        .get("details")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok((
        cleaned,
        Some(BookingDraft {
            date,
            time,
            customer_name,
            details,
        }),
    ))
}

/// 12-hour first ("2:00 PM"), 24-hour second ("14:00")
fn parse_time(raw: &str) -> Result<NaiveTime, ExtractError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| ExtractError::Time(raw.to_string()))
}

fn split_fenced_block(text: &str) -> Option<(String, String)> {
    let start = text.find(JSON_FENCE_OPEN)?;
    let after_open = start + JSON_FENCE_OPEN.len();
    let close = text[after_open..].find(FENCE_CLOSE)? + after_open;
    let raw = text[after_open..close].trim().to_string();
    let cleaned = format!(
        "{}{}",
        &text[..start],
        &text[close + FENCE_CLOSE.len()..]
    );
    Some((cleaned.trim().to_string(), raw))
}

fn split_legacy_block(text: &str) -> Option<(String, String)> {
    let start = text.find(LEGACY_TAG)?;
    let after_tag = start + LEGACY_TAG.len();
    let brace = text[after_tag..].find('{')? + after_tag;

    // walk to the matching close brace, then expect the bracket
    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in text[brace..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(brace + i + c.len_utf8());
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;
    let close = text[end..].find(']')? + end;

    let raw = text[brace..end].to_string();
    let cleaned = format!("{}{}", &text[..start], &text[close + 1..]);
    Some((cleaned.trim().to_string(), raw))
}

/// Per-turn text buffer with structured-block onset detection.
///
/// Text deltas stream in small fragments, so the fence marker can be
/// split across deltas; the onset check therefore runs over the whole
/// accumulated buffer, and extraction only over the completed turn.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    buffer: String,
    block_seen: bool,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta. Returns true exactly once per turn, when the onset
    /// of a structured block first appears in the accumulated text.
    pub fn push(&mut self, delta: &str) -> bool {
        self.buffer.push_str(delta);
        if !self.block_seen
            && (self.buffer.contains(JSON_FENCE_OPEN) || self.buffer.contains(LEGACY_TAG))
        {
            self.block_seen = true;
            return true;
        }
        false
    }

    pub fn block_seen(&self) -> bool {
        self.block_seen
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drain the completed turn's text and reset for the next turn
    pub fn take(&mut self) -> String {
        self.block_seen = false;
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_confirmed_block() {
        let reply = "Sure, see you then.\n```json\n{\"booking_confirmed\":{\"time\":\"14:00\",\"date\":\"2024-05-01\",\"name\":\"Ana\",\"details\":\"checkup\"}}\n```";
        let (cleaned, draft) = extract(reply, today()).unwrap();
        let draft = draft.unwrap();

        assert_eq!(cleaned, "Sure, see you then.");
        assert_eq!(draft.time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(draft.customer_name, "Ana");
        assert_eq!(draft.details, "checkup");
    }

    #[test]
    fn test_twelve_hour_time_and_defaults() {
        let reply = "Done!\n```json\n{\"booking_confirmed\":{\"time\":\"2:30 PM\"}}\n```";
        let (cleaned, draft) = extract(reply, today()).unwrap();
        let draft = draft.unwrap();

        assert_eq!(cleaned, "Done!");
        assert_eq!(draft.time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(draft.date, today());
        assert_eq!(draft.customer_name, "Unknown");
        assert_eq!(draft.details, "");
    }

    #[test]
    fn test_no_block_is_unchanged() {
        let reply = "We open at 9 AM, would that work?";
        let (cleaned, draft) = extract(reply, today()).unwrap();
        assert_eq!(cleaned, reply);
        assert!(draft.is_none());
    }

    #[test]
    fn test_invalid_json_is_unchanged() {
        let reply = "Okay.\n```json\n{not json at all\n```";
        let (cleaned, draft) = extract(reply, today()).unwrap();
        assert_eq!(cleaned, reply);
        assert!(draft.is_none());
    }

    #[test]
    fn test_invalid_time_is_an_error() {
        let reply = "Booked.\n```json\n{\"booking_confirmed\":{\"time\":\"half past two\"}}\n```";
        assert!(matches!(
            extract(reply, today()),
            Err(ExtractError::Time(_))
        ));
    }

    #[test]
    fn test_json_without_confirmation_strips_block() {
        let reply = "Here.\n```json\n{\"note\":\"nothing booked\"}\n```";
        let (cleaned, draft) = extract(reply, today()).unwrap();
        assert_eq!(cleaned, "Here.");
        assert!(draft.is_none());
    }

    #[test]
    fn test_legacy_bracket_fallback() {
        let reply = "All set. [BOOKING: {\"booking_confirmed\":{\"time\":\"10:00\",\"name\":\"Raj\"}}]";
        let (cleaned, draft) = extract(reply, today()).unwrap();
        let draft = draft.unwrap();

        assert_eq!(cleaned, "All set.");
        assert_eq!(draft.time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(draft.customer_name, "Raj");
    }

    #[test]
    fn test_accumulator_onset_across_deltas() {
        let mut acc = TurnAccumulator::new();
        assert!(!acc.push("Great, you are booked. ``"));
        assert!(!acc.push("`js"));
        assert!(acc.push("on\n{\"booking_confirmed\":{}}"));
        assert!(acc.block_seen());
        // only reported once
        assert!(!acc.push(" trailing"));

        let text = acc.take();
        assert!(text.contains("```json"));
        assert!(!acc.block_seen());
        assert!(acc.is_empty());
    }
}
