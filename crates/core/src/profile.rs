//! Assistant profile and weekly opening map

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Voice selection for the speech model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VoiceType {
    Male,
    #[default]
    Female,
}

impl VoiceType {
    /// Backend voice name for this voice type
    pub fn model_voice(&self) -> &'static str {
        match self {
            VoiceType::Male => "alloy",
            VoiceType::Female => "coral",
        }
    }
}

/// Weekly opening map keyed by lowercase day name ("monday" .. "sunday").
///
/// Days missing from the map are treated as closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdayMap(pub BTreeMap<String, bool>);

impl WeekdayMap {
    /// Monday through Friday open, weekend closed
    pub fn weekdays() -> Self {
        let mut map = BTreeMap::new();
        for day in ["monday", "tuesday", "wednesday", "thursday", "friday"] {
            map.insert(day.to_string(), true);
        }
        for day in ["saturday", "sunday"] {
            map.insert(day.to_string(), false);
        }
        Self(map)
    }

    pub fn is_open(&self, day: chrono::Weekday) -> bool {
        self.0.get(day_key(day)).copied().unwrap_or(false)
    }

    pub fn set(&mut self, day: chrono::Weekday, open: bool) {
        self.0.insert(day_key(day).to_string(), open);
    }
}

impl Default for WeekdayMap {
    fn default() -> Self {
        Self::weekdays()
    }
}

pub(crate) fn day_key(day: chrono::Weekday) -> &'static str {
    match day {
        chrono::Weekday::Mon => "monday",
        chrono::Weekday::Tue => "tuesday",
        chrono::Weekday::Wed => "wednesday",
        chrono::Weekday::Thu => "thursday",
        chrono::Weekday::Fri => "friday",
        chrono::Weekday::Sat => "saturday",
        chrono::Weekday::Sun => "sunday",
    }
}

/// Configuration of one phone assistant.
///
/// Loaded through the profile store collaborator; business hours are kept
/// as 24-hour `HH:MM` strings the way they are entered, parsing happens in
/// the slot calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantProfile {
    pub id: Uuid,

    /// Assistant display name spoken on the call
    pub name: String,

    pub business_name: String,

    /// Free-text description of the business, injected into instructions
    #[serde(default)]
    pub description: String,

    /// Opening time, 24-hour "HH:MM"
    pub start_time: String,

    /// Closing time, 24-hour "HH:MM"
    pub end_time: String,

    /// Appointment slot length in minutes
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,

    /// Weekly opening map; `None` means the default Monday-Friday week
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_days: Option<WeekdayMap>,

    /// Number the assistant answers on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub voice: VoiceType,
}

fn default_slot_minutes() -> u32 {
    30
}

impl AssistantProfile {
    pub fn new(name: impl Into<String>, business_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            business_name: business_name.into(),
            description: String::new(),
            start_time: "09:00".to_string(),
            end_time: "17:00".to_string(),
            slot_minutes: default_slot_minutes(),
            available_days: None,
            phone_number: None,
            voice: VoiceType::default(),
        }
    }

    /// Set business hours ("HH:MM", 24-hour)
    pub fn hours(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_time = start.into();
        self.end_time = end.into();
        self
    }

    pub fn slot_minutes(mut self, minutes: u32) -> Self {
        self.slot_minutes = minutes;
        self
    }

    pub fn available_days(mut self, days: WeekdayMap) -> Self {
        self.available_days = Some(days);
        self
    }

    pub fn voice(mut self, voice: VoiceType) -> Self {
        self.voice = voice;
        self
    }

    /// Opening map, falling back to the Monday-Friday default
    pub fn opening_days(&self) -> WeekdayMap {
        self.available_days.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_map_default() {
        let days = WeekdayMap::default();
        assert!(days.is_open(chrono::Weekday::Mon));
        assert!(days.is_open(chrono::Weekday::Fri));
        assert!(!days.is_open(chrono::Weekday::Sat));
        assert!(!days.is_open(chrono::Weekday::Sun));
    }

    #[test]
    fn test_weekday_map_missing_day_closed() {
        let days = WeekdayMap(BTreeMap::new());
        assert!(!days.is_open(chrono::Weekday::Wed));
    }

    #[test]
    fn test_profile_builder() {
        let profile = AssistantProfile::new("Mia", "Sunrise Dental")
            .hours("08:00", "16:00")
            .slot_minutes(45)
            .voice(VoiceType::Male);

        assert_eq!(profile.start_time, "08:00");
        assert_eq!(profile.slot_minutes, 45);
        assert_eq!(profile.voice.model_voice(), "alloy");
        assert!(profile.opening_days().is_open(chrono::Weekday::Tue));
    }

    #[test]
    fn test_voice_type_serde() {
        let v: VoiceType = serde_json::from_str("\"female\"").unwrap();
        assert_eq!(v, VoiceType::Female);
        assert_eq!(v.model_voice(), "coral");
    }
}
