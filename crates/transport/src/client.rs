//! Model backend WebSocket client
//!
//! Outbound realtime connection, split into its two relay halves so each
//! relay task owns exactly one direction.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::model::{ModelCommand, ModelEvent};
use crate::traits::{ModelSink, ModelStream};
use crate::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection settings for the realtime model backend
#[derive(Debug, Clone)]
pub struct ModelBackendConfig {
    /// wss:// endpoint including the model query parameter
    pub url: String,
    pub api_key: String,
    pub connect_timeout: Duration,
}

impl ModelBackendConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

pub struct ModelClientSink {
    write: SplitSink<WsStream, Message>,
}

pub struct ModelClientStream {
    read: SplitStream<WsStream>,
}

/// Open the realtime channel and split it into its two relay halves
pub async fn connect(
    config: &ModelBackendConfig,
) -> Result<(ModelClientSink, ModelClientStream), TransportError> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

    let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    request.headers_mut().insert("Authorization", auth);
    request
        .headers_mut()
        .insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

    let (ws, _response) = tokio::time::timeout(config.connect_timeout, connect_async(request))
        .await
        .map_err(|_| TransportError::Timeout("model backend connect".to_string()))?
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

    tracing::info!(url = %config.url, "connected to model backend");

    let (write, read) = ws.split();
    Ok((ModelClientSink { write }, ModelClientStream { read }))
}

#[async_trait]
impl ModelSink for ModelClientSink {
    async fn send(&mut self, command: ModelCommand) -> Result<(), TransportError> {
        let text =
            serde_json::to_string(&command).map_err(|e| TransportError::Malformed(e.to_string()))?;
        self.write
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // best effort; the peer may already be gone
        let _ = self.write.send(Message::Close(None)).await;
        Ok(())
    }
}

#[async_trait]
impl ModelStream for ModelClientStream {
    async fn next_event(&mut self) -> Result<Option<ModelEvent>, TransportError> {
        while let Some(message) = self.read.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<ModelEvent>(&text) {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed model event");
                    }
                },
                Ok(Message::Close(_)) => return Ok(None),
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(_) => {
                    tracing::warn!("ignoring non-text model frame");
                }
                Err(e) => return Err(TransportError::ConnectionFailed(e.to_string())),
            }
        }
        Ok(None)
    }
}
