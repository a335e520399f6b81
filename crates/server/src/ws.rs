//! Telephony media-stream WebSocket endpoint
//!
//! Accepts the carrier's WebSocket, pumps its frames through in-process
//! channel transports, dials the model backend and runs one call handler
//! per connection.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use frontdesk_bridge::{CallContext, CallHandler, CallInfo};
use frontdesk_core::AssistantProfile;
use frontdesk_transport::{connect, telephony_channel, ModelBackendConfig, TelephonyEvent};

use crate::state::AppState;
use crate::ServerError;

/// Upgrade handler for the carrier's media stream
pub async fn media_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(assistant_id): Path<Uuid>,
) -> Result<Response, ServerError> {
    let profile = state
        .persistence
        .profiles
        .load_profile(assistant_id)
        .await
        .map_err(|e| ServerError::Session(e.to_string()))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, profile)))
}

async fn handle_socket(socket: WebSocket, state: AppState, profile: AssistantProfile) {
    let conversation_id = Uuid::new_v4();

    let _guard = match state
        .registry
        .register(CallInfo::new(conversation_id, profile.id))
    {
        Ok(guard) => guard,
        Err(err) => {
            tracing::warn!(%conversation_id, error = %err, "refusing call");
            return;
        }
    };

    let backend = ModelBackendConfig {
        url: state.config.model.url.clone(),
        api_key: state.config.model.api_key.clone(),
        connect_timeout: Duration::from_secs(state.config.model.connect_timeout_seconds),
    };
    let (model_sink, model_stream) = match connect(&backend).await {
        Ok(halves) => halves,
        Err(err) => {
            tracing::error!(%conversation_id, error = %err, "model backend unavailable");
            return;
        }
    };

    let (telephony_stream, telephony_sink, event_tx, mut frame_rx) =
        telephony_channel(state.config.bridge.channel_capacity);

    let (mut ws_tx, mut ws_rx) = socket.split();

    // carrier -> bridge
    let inbound_pump = tokio::spawn(async move {
        while let Some(message) = ws_rx.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<TelephonyEvent>(&text) {
                    Ok(event) => {
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping malformed telephony frame");
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "telephony socket error");
                    break;
                }
            }
        }
        // dropping event_tx ends the bridge's telephony stream
    });

    // bridge -> carrier
    let outbound_pump = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unserializable outbound frame");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let context = CallContext {
        conversation_id,
        profile,
        persistence: state.persistence.clone(),
        idle_timeout: Duration::from_secs(state.config.bridge.idle_timeout_seconds),
    };

    match CallHandler::new(context)
        .run(telephony_stream, telephony_sink, model_stream, model_sink)
        .await
    {
        Ok(outcome) => {
            tracing::info!(
                %conversation_id,
                booking = ?outcome.booking_id,
                "call finished"
            );
        }
        Err(err) => {
            tracing::warn!(%conversation_id, error = %err, "call failed");
        }
    }

    // the handler closed its sink, so the outbound pump drains and exits
    let _ = outbound_pump.await;
    inbound_pump.abort();
}
