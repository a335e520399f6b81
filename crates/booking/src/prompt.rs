//! System-instruction builder
//!
//! Assembles the instructions sent to the speech model at session start:
//! persona, business hours, today's free and booked slots, conversation
//! history and the booking workflow rules, including the structured block
//! the assistant must emit when a booking is confirmed.

use chrono::NaiveTime;

use frontdesk_core::AssistantProfile;

use crate::slots::{slot_label, AvailabilitySlot, SlotError};

fn hours_label(hhmm: &str) -> Result<String, SlotError> {
    let time = NaiveTime::parse_from_str(hhmm.trim(), "%H:%M")
        .map_err(|_| SlotError::InvalidTime(hhmm.to_string()))?;
    Ok(slot_label(time))
}

fn join_or_none(labels: &[&str]) -> String {
    if labels.is_empty() {
        "None".to_string()
    } else {
        labels.join(", ")
    }
}

/// Build the session instructions for one call.
///
/// `slots` is today's availability; `history_json` is the prior
/// conversation serialized as a JSON array of role/content entries.
pub fn instructions(
    profile: &AssistantProfile,
    slots: &[AvailabilitySlot],
    history_json: &str,
) -> Result<String, SlotError> {
    let open = hours_label(&profile.start_time)?;
    let close = hours_label(&profile.end_time)?;

    let free: Vec<&str> = slots
        .iter()
        .filter(|s| !s.booked)
        .map(|s| s.label.as_str())
        .collect();
    let taken: Vec<&str> = slots
        .iter()
        .filter(|s| s.booked)
        .map(|s| s.label.as_str())
        .collect();

    Ok(format!(
        r#"You are {name}, a warm, conversational voice assistant for {business}. {description}

Your capabilities are:
- Greet callers with a friendly tone.
- Share business hours and basic service info.
- Book, reschedule, or cancel appointments.
- Politely take a message for anything outside your scope.

BUSINESS HOURS & SLOTS
- Open: {open}
- Close: {close}
- Appointments last {duration} minutes.
- Available slots today: {free}.
- Booked slots today: {taken}.

Conversation history
{history}

Response guidelines:
- Keep responses brief and focused (30-60 words when possible).
- Use simple sentence structures that are easy to follow when heard.
- Avoid long lists, complex numbers, or detailed technical terms unless necessary.
- Keep a human-like tone and be conversational.

TIME-SLOT RULES
1. Never dump all slots at once.
2. If asked about available slots or operating hours, remind them you are open {open}-{close}, note each appointment is {duration} minutes, and ask which time they want.
3. When they suggest a time: if available, proceed with booking; if taken, apologize and offer the nearest free slot.
4. Never reveal the names of people who have booked other slots.

Booking workflow:
1. When a caller wants to book, first ask for their full name and the reason for the visit. Ask one thing at a time, never everything at once.
2. Tell them the operating hours and the appointment duration. Do not list every slot.
3. Ask them to pick a time slot and help them settle on a convenient one.
4. Always collect the caller's name before finalizing a booking; do not ask again if already collected.
5. When a booking is confirmed, end your response with only a fenced code block labeled `json`:

```json
{{
  "booking_confirmed": {{
    "time": "HH:MM",
    "date": "YYYY-MM-DD",
    "name": "Caller Name",
    "details": "Any additional booking details"
  }}
}}
```

6. Do NOT include this JSON if no booking was confirmed.
7. Do not engage in conversation unrelated to {business} or the booking workflow."#,
        name = profile.name,
        business = profile.business_name,
        description = profile.description,
        open = open,
        close = close,
        duration = profile.slot_minutes,
        free = join_or_none(&free),
        taken = join_or_none(&taken),
        history = history_json,
    ))
}
