//! End-to-end call relay tests over in-process channel transports
//!
//! Each test drives a `CallHandler` with scripted carrier and model events
//! and asserts on the commands, frames and records that come out the
//! other side.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use frontdesk_bridge::{BridgeError, CallContext, CallHandler, CallOutcome};
use frontdesk_core::{AssistantProfile, Role, WeekdayMap};
use frontdesk_persistence::{in_memory, PersistenceLayer};
use frontdesk_transport::{
    model_channel, telephony_channel, MediaPayload, ModelCommand, ModelEvent, StreamStart,
    TelephonyEvent, TelephonyOutbound,
};

const WAIT: Duration = Duration::from_secs(1);

/// Open all seven days so tests do not depend on the calendar day they run
fn open_week() -> WeekdayMap {
    let mut days = WeekdayMap::weekdays();
    days.set(chrono::Weekday::Sat, true);
    days.set(chrono::Weekday::Sun, true);
    days
}

fn test_profile() -> AssistantProfile {
    AssistantProfile::new("Maya", "Lakeside Dental")
        .hours("09:00", "17:00")
        .slot_minutes(30)
        .available_days(open_week())
}

fn test_context(profile: AssistantProfile, persistence: PersistenceLayer) -> CallContext {
    CallContext {
        conversation_id: Uuid::new_v4(),
        profile,
        persistence,
        idle_timeout: Duration::from_secs(5),
    }
}

fn start_event(stream_sid: &str) -> TelephonyEvent {
    TelephonyEvent::Start {
        start: StreamStart {
            stream_sid: stream_sid.to_string(),
            call_sid: None,
        },
    }
}

fn media_event(payload: &str) -> TelephonyEvent {
    TelephonyEvent::Media {
        media: MediaPayload::new(payload),
    }
}

/// Let the spawned relay tasks drain everything queued so far
async fn settle() {
    sleep(Duration::from_millis(50)).await;
}

/// A barge-in while the assistant is speaking produces exactly one
/// truncate command and one clear frame, and audio keeps flowing after
/// the interruption is handled.
#[tokio::test]
async fn test_barge_in_truncates_then_clears() {
    let persistence = in_memory();
    let context = test_context(test_profile(), persistence);

    let (t_stream, t_sink, t_events, mut t_frames) = telephony_channel(32);
    let (m_stream, m_sink, m_events, mut m_commands) = model_channel(32);

    let run = tokio::spawn(CallHandler::new(context).run(t_stream, t_sink, m_stream, m_sink));

    // session configuration goes out before any audio
    let first = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();
    assert!(matches!(first, ModelCommand::SessionUpdate { .. }));

    t_events.send(TelephonyEvent::Connected).await.unwrap();
    t_events.send(start_event("MZ1")).await.unwrap();
    settle().await;

    // assistant audio is relayed to the carrier
    m_events
        .send(ModelEvent::AudioDelta {
            delta: Some("QUJD".to_string()),
        })
        .await
        .unwrap();
    let frame = timeout(WAIT, t_frames.recv()).await.unwrap().unwrap();
    assert_eq!(frame, TelephonyOutbound::media("MZ1", "QUJD"));

    // caller talks over the assistant
    m_events
        .send(ModelEvent::SpeechStarted {
            item_id: "item_7".to_string(),
            audio_start_ms: 750,
        })
        .await
        .unwrap();

    let command = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();
    assert_eq!(
        command,
        ModelCommand::TruncateItem {
            item_id: "item_7".to_string(),
            content_index: 0,
            audio_end_ms: 750,
        }
    );
    let frame = timeout(WAIT, t_frames.recv()).await.unwrap().unwrap();
    assert_eq!(frame, TelephonyOutbound::clear("MZ1"));

    // relay resumed, later audio still reaches the carrier
    m_events
        .send(ModelEvent::AudioDelta {
            delta: Some("REVG".to_string()),
        })
        .await
        .unwrap();
    let frame = timeout(WAIT, t_frames.recv()).await.unwrap().unwrap();
    assert_eq!(frame, TelephonyOutbound::media("MZ1", "REVG"));

    t_events.send(TelephonyEvent::Stop).await.unwrap();
    let outcome = timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    assert!(outcome.booking_id.is_none());

    // no stray clear or media frames after the call closed
    assert!(timeout(WAIT, t_frames.recv()).await.unwrap().is_none());
    assert!(timeout(WAIT, m_commands.recv()).await.unwrap().is_none());
}

/// A confirmed booking block suppresses assistant audio, persists one
/// record, closes the call and strips the block from the transcript.
#[tokio::test]
async fn test_booking_confirmed_end_to_end() {
    let persistence = in_memory();
    let profile = test_profile();
    let assistant_id = profile.id;
    let context = test_context(profile, persistence.clone());
    let conversation_id = context.conversation_id;

    let (t_stream, t_sink, t_events, mut t_frames) = telephony_channel(32);
    let (m_stream, m_sink, m_events, mut m_commands) = model_channel(32);

    let run = tokio::spawn(CallHandler::new(context).run(t_stream, t_sink, m_stream, m_sink));
    let _ = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();

    t_events.send(start_event("MZ2")).await.unwrap();
    settle().await;

    // the fence marker is split across deltas; onset fires on the second
    m_events
        .send(ModelEvent::ContentDelta {
            delta: Some("You are booked for ten. ``".to_string()),
        })
        .await
        .unwrap();
    m_events
        .send(ModelEvent::ContentDelta {
            delta: Some(
                "`json\n{\"booking_confirmed\":{\"time\":\"10:00\",\"name\":\"Ana\",\"details\":\"checkup\"}}\n```"
                    .to_string(),
            ),
        })
        .await
        .unwrap();

    // onset clears any queued assistant audio at the carrier
    let frame = timeout(WAIT, t_frames.recv()).await.unwrap().unwrap();
    assert_eq!(frame, TelephonyOutbound::clear("MZ2"));

    m_events.send(ModelEvent::ResponseDone).await.unwrap();

    let outcome: CallOutcome = timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    let booking_id = outcome.booking_id.unwrap();

    let today = Utc::now().date_naive();
    let booked = persistence
        .bookings
        .booked_slots(assistant_id, today)
        .await
        .unwrap();
    let record = booked.get("10:00 AM").unwrap();
    assert_eq!(record.id, booking_id);
    assert_eq!(record.customer_name, "Ana");
    assert_eq!(record.details, "checkup");

    // transcript keeps the spoken sentence, not the structured block
    let entries = persistence.transcripts.load(conversation_id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].role, Role::Assistant);
    assert_eq!(entries[0].content, "You are booked for ten.");

    assert!(timeout(WAIT, t_frames.recv()).await.unwrap().is_none());
}

/// A second booking block queued behind the first never reaches the store
#[tokio::test]
async fn test_at_most_once_booking() {
    let persistence = in_memory();
    let profile = test_profile();
    let assistant_id = profile.id;
    let context = test_context(profile, persistence.clone());

    let (t_stream, t_sink, t_events, _t_frames) = telephony_channel(32);
    let (m_stream, m_sink, m_events, mut m_commands) = model_channel(32);

    let run = tokio::spawn(CallHandler::new(context).run(t_stream, t_sink, m_stream, m_sink));
    let _ = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();

    t_events.send(start_event("MZ3")).await.unwrap();
    settle().await;

    for slot in ["10:00", "11:00"] {
        m_events
            .send(ModelEvent::ContentDelta {
                delta: Some(format!(
                    "Booked.\n```json\n{{\"booking_confirmed\":{{\"time\":\"{slot}\",\"name\":\"Raj\"}}}}\n```"
                )),
            })
            .await
            .unwrap();
        m_events.send(ModelEvent::ResponseDone).await.unwrap();
    }

    let outcome = timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    assert!(outcome.booking_id.is_some());

    let today = Utc::now().date_naive();
    let booked = persistence
        .bookings
        .booked_slots(assistant_id, today)
        .await
        .unwrap();
    assert_eq!(booked.len(), 1);
    assert!(booked.contains_key("10:00 AM"));
}

/// Drafts for taken or off-grid slots are discarded and the call goes on
#[tokio::test]
async fn test_unavailable_slot_discarded() {
    let persistence = in_memory();
    let profile = test_profile();
    let assistant_id = profile.id;

    // 10:00 AM is already taken today
    let today = Utc::now().date_naive();
    let taken = frontdesk_core::BookingRecord::from_draft(
        assistant_id,
        frontdesk_core::BookingDraft {
            date: today,
            time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            customer_name: "Earlier".to_string(),
            details: String::new(),
        },
    );
    persistence.bookings.persist_booking(taken).await.unwrap();

    let context = test_context(profile, persistence.clone());

    let (t_stream, t_sink, t_events, _t_frames) = telephony_channel(32);
    let (m_stream, m_sink, m_events, mut m_commands) = model_channel(32);

    let run = tokio::spawn(CallHandler::new(context).run(t_stream, t_sink, m_stream, m_sink));
    let _ = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();

    t_events.send(start_event("MZ4")).await.unwrap();
    settle().await;

    // taken slot, then a time outside business hours
    for slot in ["10:00", "20:00"] {
        m_events
            .send(ModelEvent::ContentDelta {
                delta: Some(format!(
                    "Booked.\n```json\n{{\"booking_confirmed\":{{\"time\":\"{slot}\"}}}}\n```"
                )),
            })
            .await
            .unwrap();
        m_events.send(ModelEvent::ResponseDone).await.unwrap();
    }
    settle().await;

    t_events.send(TelephonyEvent::Stop).await.unwrap();
    let outcome = timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    assert!(outcome.booking_id.is_none());

    let booked = persistence
        .bookings
        .booked_slots(assistant_id, today)
        .await
        .unwrap();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked.get("10:00 AM").unwrap().customer_name, "Earlier");
}

/// Caller media is dropped before the start frame and forwarded after it;
/// hanging up closes the relay cleanly.
#[tokio::test]
async fn test_media_gating_and_hang_up() {
    let persistence = in_memory();
    let context = test_context(test_profile(), persistence);

    let (t_stream, t_sink, t_events, _t_frames) = telephony_channel(32);
    let (m_stream, m_sink, _m_events, mut m_commands) = model_channel(32);

    let run = tokio::spawn(CallHandler::new(context).run(t_stream, t_sink, m_stream, m_sink));
    let _ = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();

    // media before the start frame never reaches the model
    t_events.send(media_event("AAAA")).await.unwrap();
    t_events.send(start_event("MZ5")).await.unwrap();
    settle().await;

    t_events.send(media_event("QUJD")).await.unwrap();
    let command = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();
    assert_eq!(
        command,
        ModelCommand::AppendAudio {
            audio: "QUJD".to_string(),
        }
    );

    // frames that are not valid base64 are dropped too
    t_events.send(media_event("not base64!!!")).await.unwrap();

    t_events.send(TelephonyEvent::Stop).await.unwrap();
    let outcome = timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    assert!(outcome.booking_id.is_none());

    // only the one decodable frame was appended
    assert!(timeout(WAIT, m_commands.recv()).await.unwrap().is_none());
}

/// A silent call is torn down after the idle timeout
#[tokio::test]
async fn test_idle_timeout_tears_down() {
    let persistence = in_memory();
    let mut context = test_context(test_profile(), persistence);
    context.idle_timeout = Duration::from_millis(100);

    let (t_stream, t_sink, _t_events, _t_frames) = telephony_channel(32);
    let (m_stream, m_sink, _m_events, mut m_commands) = model_channel(32);

    let run = tokio::spawn(CallHandler::new(context).run(t_stream, t_sink, m_stream, m_sink));
    let _ = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();

    let result = timeout(Duration::from_secs(2), run).await.unwrap().unwrap();
    assert!(matches!(result, Err(BridgeError::IdleTimeout)));
}

/// The model backend dropping its stream closes the call without an error
#[tokio::test]
async fn test_backend_close_ends_call() {
    let persistence = in_memory();
    let context = test_context(test_profile(), persistence);

    let (t_stream, t_sink, t_events, _t_frames) = telephony_channel(32);
    let (m_stream, m_sink, m_events, mut m_commands) = model_channel(32);

    let run = tokio::spawn(CallHandler::new(context).run(t_stream, t_sink, m_stream, m_sink));
    let _ = timeout(WAIT, m_commands.recv()).await.unwrap().unwrap();

    t_events.send(start_event("MZ6")).await.unwrap();
    settle().await;

    drop(m_events);
    let outcome = timeout(WAIT, run).await.unwrap().unwrap().unwrap();
    assert!(outcome.booking_id.is_none());
}
