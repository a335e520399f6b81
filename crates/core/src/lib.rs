//! Core types for the call bridge
//!
//! This crate provides foundational types used across all other crates:
//! - Transcript roles and entries
//! - Assistant profiles and weekly opening maps
//! - Booking drafts and records
//! - The shared error taxonomy

pub mod booking;
pub mod error;
pub mod profile;
pub mod transcript;

pub use booking::{BookingDraft, BookingRecord};
pub use error::{Error, Result};
pub use profile::{AssistantProfile, VoiceType, WeekdayMap};
pub use transcript::{Role, TranscriptEntry};
