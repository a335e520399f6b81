//! Call session orchestrator
//!
//! One `CallHandler` per live call. `run()` drives the relay until the
//! call closes: an inbound task pumps caller media into the model, while
//! the orchestrator loop owns every piece of session state and reacts to
//! model events, carrier control frames and cancellation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::timeout;
use uuid::Uuid;

use frontdesk_booking::{availability, extract, instructions, slot_available, TurnAccumulator};
use frontdesk_core::{AssistantProfile, BookingDraft, BookingRecord, TranscriptEntry};
use frontdesk_persistence::PersistenceLayer;
use frontdesk_transport::{
    ModelCommand, ModelEvent, ModelSink, ModelStream, SessionConfig, TelephonyEvent,
    TelephonyOutbound, TelephonySink, TelephonyStream, TransportError,
};

use crate::turn::{TurnState, TurnTracker};
use crate::BridgeError;

/// Everything a call session needs besides its four channel halves
#[derive(Clone)]
pub struct CallContext {
    pub conversation_id: Uuid,
    pub profile: AssistantProfile,
    pub persistence: PersistenceLayer,
    pub idle_timeout: Duration,
}

/// What the call produced
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub conversation_id: Uuid,
    pub booking_id: Option<Uuid>,
}

/// Control frames the inbound pump hands to the orchestrator.
/// Media never takes this path; it goes straight to the model sink.
#[derive(Debug)]
enum ControlEvent {
    Started { stream_sid: String },
    Stopped,
    Disconnected,
    Failed(TransportError),
    TimedOut,
}

pub struct CallHandler {
    context: CallContext,
}

impl CallHandler {
    pub fn new(context: CallContext) -> Self {
        Self { context }
    }

    /// Run the relay until the session closes.
    ///
    /// Returns the outcome on a normal close (with or without a booking).
    /// Transport failures, idle timeouts and persistence rejections abort
    /// the session and surface here after both legs are closed.
    pub async fn run<TS, TK, MS, MK>(
        self,
        telephony_stream: TS,
        mut telephony_sink: TK,
        mut model_stream: MS,
        model_sink: MK,
    ) -> Result<CallOutcome, BridgeError>
    where
        TS: TelephonyStream + 'static,
        TK: TelephonySink,
        MS: ModelStream,
        MK: ModelSink + 'static,
    {
        let CallContext {
            conversation_id,
            profile,
            persistence,
            idle_timeout,
        } = self.context;

        let today = Utc::now().date_naive();
        let booked = persistence.bookings.booked_slots(profile.id, today).await?;
        let slots = availability(&profile, &booked, today)
            .map_err(|e| BridgeError::Booking(e.to_string()))?;

        let history = persistence.transcripts.load(conversation_id).await?;
        let history_json = serde_json::to_string(
            &history
                .iter()
                .map(|e| serde_json::json!({ "role": e.role.as_str(), "content": e.content }))
                .collect::<Vec<_>>(),
        )?;
        let prompt = instructions(&profile, &slots, &history_json)
            .map_err(|e| BridgeError::Booking(e.to_string()))?;

        let model_sink = Arc::new(Mutex::new(model_sink));
        model_sink
            .lock()
            .await
            .send(ModelCommand::SessionUpdate {
                session: SessionConfig::realtime(profile.voice, prompt),
            })
            .await?;

        let tracker = Arc::new(RwLock::new(TurnTracker::new()));
        tracker.write().begin_relay();
        tracing::info!(%conversation_id, assistant = %profile.name, "call relay started");

        let (control_tx, mut control_rx) = mpsc::channel(16);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let inbound = tokio::spawn(pump_inbound(
            telephony_stream,
            Arc::clone(&model_sink),
            Arc::clone(&tracker),
            control_tx,
            cancel_rx,
            idle_timeout,
        ));

        let mut relay = Relay {
            conversation_id,
            profile: &profile,
            persistence: &persistence,
            today,
            tracker: tracker.as_ref(),
            telephony_sink: &mut telephony_sink,
            model_sink: &model_sink,
            accumulator: TurnAccumulator::new(),
            booking_id: None,
        };
        let mut relay_error: Option<BridgeError> = None;

        while tracker.read().state() != TurnState::Closed {
            tokio::select! {
                maybe_control = control_rx.recv() => match maybe_control {
                    Some(ControlEvent::Started { stream_sid }) => {
                        if tracker.write().stream_started(&stream_sid) {
                            tracing::info!(%stream_sid, "media stream active");
                        }
                    }
                    Some(ControlEvent::Stopped) => {
                        tracing::info!("caller hung up");
                        tracker.write().close();
                    }
                    Some(ControlEvent::Disconnected) | None => {
                        tracing::info!("telephony stream ended");
                        tracker.write().close();
                    }
                    Some(ControlEvent::Failed(err)) => {
                        relay_error = Some(err.into());
                        tracker.write().close();
                    }
                    Some(ControlEvent::TimedOut) => {
                        relay_error = Some(BridgeError::IdleTimeout);
                        tracker.write().close();
                    }
                },
                outcome = timeout(idle_timeout, model_stream.next_event()) => match outcome {
                    Err(_) => {
                        relay_error = Some(BridgeError::IdleTimeout);
                        tracker.write().close();
                    }
                    Ok(Err(err)) => {
                        relay_error = Some(err.into());
                        tracker.write().close();
                    }
                    Ok(Ok(None)) => {
                        tracing::info!("model backend closed the stream");
                        tracker.write().close();
                    }
                    Ok(Ok(Some(event))) => {
                        if let Err(err) = relay.on_model_event(event).await {
                            relay_error = Some(err);
                            tracker.write().close();
                        }
                    }
                },
            }
        }

        let booking_id = relay.booking_id;

        let _ = cancel_tx.send(true);
        let _ = telephony_sink.close().await;
        let _ = model_sink.lock().await.close().await;
        let _ = inbound.await;

        if let Some(err) = relay_error {
            tracing::warn!(%conversation_id, error = %err, "call aborted");
            return Err(err);
        }

        tracing::info!(%conversation_id, booked = booking_id.is_some(), "call closed");
        Ok(CallOutcome {
            conversation_id,
            booking_id,
        })
    }
}

/// Orchestrator-side state threaded through model-event handling
struct Relay<'a, TK: TelephonySink, MK: ModelSink> {
    conversation_id: Uuid,
    profile: &'a AssistantProfile,
    persistence: &'a PersistenceLayer,
    today: NaiveDate,
    tracker: &'a RwLock<TurnTracker>,
    telephony_sink: &'a mut TK,
    model_sink: &'a Arc<Mutex<MK>>,
    accumulator: TurnAccumulator,
    booking_id: Option<Uuid>,
}

impl<TK: TelephonySink, MK: ModelSink> Relay<'_, TK, MK> {
    async fn on_model_event(&mut self, event: ModelEvent) -> Result<(), BridgeError> {
        match event {
            ModelEvent::SessionReady => {
                tracing::debug!("model session ready");
            }
            ModelEvent::SpeechStarted {
                item_id,
                audio_start_ms,
            } => {
                if self.tracker.write().interrupt() {
                    tracing::debug!(%item_id, audio_start_ms, "caller barge-in");
                    self.model_sink
                        .lock()
                        .await
                        .send(ModelCommand::TruncateItem {
                            item_id,
                            content_index: 0,
                            audio_end_ms: audio_start_ms,
                        })
                        .await?;
                    self.clear_carrier_buffer().await?;
                    self.tracker.write().resume();
                }
            }
            ModelEvent::SpeechFinal { text } => {
                if let Some(text) = text {
                    self.record(TranscriptEntry::user(text)).await?;
                }
            }
            ModelEvent::TranscriptionCompleted { transcript } => {
                if let Some(transcript) = transcript {
                    self.record(TranscriptEntry::user(transcript)).await?;
                }
            }
            ModelEvent::AudioDelta { delta } => {
                if let Some(payload) = delta {
                    let (forwards, stream_sid) = {
                        let tracker = self.tracker.read();
                        (
                            tracker.forwards_model_audio(),
                            tracker.stream_sid().map(str::to_string),
                        )
                    };
                    if forwards {
                        if let Some(sid) = stream_sid {
                            self.telephony_sink
                                .send(TelephonyOutbound::media(sid, payload))
                                .await?;
                        }
                    }
                }
            }
            ModelEvent::ContentDelta { delta } => {
                if let Some(chunk) = delta {
                    let onset = self.accumulator.push(&chunk);
                    if onset && self.tracker.write().suppress_audio() {
                        tracing::debug!("structured block onset, suppressing assistant audio");
                        self.clear_carrier_buffer().await?;
                    }
                }
            }
            ModelEvent::ResponseDone => {
                self.on_turn_completed().await?;
            }
            ModelEvent::Error { error } => {
                tracing::warn!(%error, "model backend reported an error");
            }
            ModelEvent::Unknown => {
                tracing::debug!("ignoring unknown model event");
            }
        }
        Ok(())
    }

    /// Tell the carrier to drop any queued assistant audio
    async fn clear_carrier_buffer(&mut self) -> Result<(), BridgeError> {
        let stream_sid = self.tracker.read().stream_sid().map(str::to_string);
        if let Some(sid) = stream_sid {
            self.telephony_sink
                .send(TelephonyOutbound::clear(sid))
                .await?;
        }
        Ok(())
    }

    async fn on_turn_completed(&mut self) -> Result<(), BridgeError> {
        let text = self.accumulator.take();
        if !text.trim().is_empty() {
            match extract(&text, self.today) {
                Err(err) => {
                    tracing::warn!(error = %err, "discarding unparseable booking draft");
                    self.record(TranscriptEntry::assistant(text)).await?;
                }
                Ok((cleaned, None)) => {
                    self.record(TranscriptEntry::assistant(cleaned)).await?;
                }
                Ok((cleaned, Some(draft))) => {
                    self.record(TranscriptEntry::assistant(cleaned)).await?;
                    self.try_book(draft).await?;
                }
            }
        }
        self.tracker.write().turn_completed();
        Ok(())
    }

    async fn try_book(&mut self, draft: BookingDraft) -> Result<(), BridgeError> {
        let booked = self
            .persistence
            .bookings
            .booked_slots(self.profile.id, draft.date)
            .await?;
        let available = slot_available(self.profile, &booked, &draft)
            .map_err(|e| BridgeError::Booking(e.to_string()))?;
        if !available {
            tracing::warn!(
                date = %draft.date,
                time = %draft.time,
                "requested slot not available, draft discarded"
            );
            return Ok(());
        }

        // Finalizing is entered before the store await, so a second draft
        // in the same session can never reach the store.
        if !self.tracker.write().finalize() {
            tracing::warn!("booking already finalized for this call, draft ignored");
            return Ok(());
        }

        let record = BookingRecord::from_draft(self.profile.id, draft);
        let id = self.persistence.bookings.persist_booking(record).await?;
        self.booking_id = Some(id);
        tracing::info!(
            conversation_id = %self.conversation_id,
            booking_id = %id,
            "booking confirmed"
        );

        let _ = self.telephony_sink.close().await;
        self.tracker.write().close();
        Ok(())
    }

    async fn record(&self, entry: TranscriptEntry) -> Result<(), BridgeError> {
        self.persistence
            .transcripts
            .append(self.conversation_id, entry)
            .await?;
        Ok(())
    }
}

/// Inbound relay task: owns the telephony receive half.
///
/// Media is forwarded straight to the model sink while the tracker
/// accepts it; start/stop control frames go to the orchestrator.
async fn pump_inbound<TS, MK>(
    mut stream: TS,
    model_sink: Arc<Mutex<MK>>,
    tracker: Arc<RwLock<TurnTracker>>,
    control_tx: mpsc::Sender<ControlEvent>,
    mut cancel_rx: watch::Receiver<bool>,
    idle_timeout: Duration,
) where
    TS: TelephonyStream,
    MK: ModelSink,
{
    loop {
        let outcome = tokio::select! {
            _ = cancel_rx.changed() => {
                if *cancel_rx.borrow() {
                    break;
                }
                continue;
            }
            outcome = timeout(idle_timeout, stream.next_event()) => outcome,
        };

        match outcome {
            Err(_) => {
                let _ = control_tx.send(ControlEvent::TimedOut).await;
                break;
            }
            Ok(Err(err)) => {
                let _ = control_tx.send(ControlEvent::Failed(err)).await;
                break;
            }
            Ok(Ok(None)) => {
                let _ = control_tx.send(ControlEvent::Disconnected).await;
                break;
            }
            Ok(Ok(Some(TelephonyEvent::Connected))) => {
                tracing::debug!("telephony preamble received");
            }
            Ok(Ok(Some(TelephonyEvent::Start { start }))) => {
                let _ = control_tx
                    .send(ControlEvent::Started {
                        stream_sid: start.stream_sid,
                    })
                    .await;
            }
            Ok(Ok(Some(TelephonyEvent::Media { media }))) => {
                if !tracker.read().accepts_media() {
                    continue;
                }
                if media.decode().is_err() {
                    tracing::warn!("skipping undecodable media payload");
                    continue;
                }
                let send = model_sink
                    .lock()
                    .await
                    .send(ModelCommand::AppendAudio {
                        audio: media.payload,
                    })
                    .await;
                if let Err(err) = send {
                    let _ = control_tx.send(ControlEvent::Failed(err)).await;
                    break;
                }
            }
            Ok(Ok(Some(TelephonyEvent::Stop))) => {
                let _ = control_tx.send(ControlEvent::Stopped).await;
                break;
            }
            Ok(Ok(Some(TelephonyEvent::Unknown))) => {
                tracing::warn!("ignoring unknown telephony event");
            }
        }
    }
}
