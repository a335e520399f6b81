//! In-process channel transports
//!
//! mpsc-backed implementations of the channel traits, used by tests and
//! by socket pumps that bridge a raw connection into the relay.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::model::{ModelCommand, ModelEvent};
use crate::telephony::{TelephonyEvent, TelephonyOutbound};
use crate::traits::{ModelSink, ModelStream, TelephonySink, TelephonyStream};
use crate::TransportError;

pub struct ChannelTelephonyStream {
    rx: mpsc::Receiver<TelephonyEvent>,
}

pub struct ChannelTelephonySink {
    tx: Option<mpsc::Sender<TelephonyOutbound>>,
}

/// Build a telephony channel pair: the bridge-facing halves plus the
/// peer-side handles the driver feeds and drains.
pub fn telephony_channel(
    capacity: usize,
) -> (
    ChannelTelephonyStream,
    ChannelTelephonySink,
    mpsc::Sender<TelephonyEvent>,
    mpsc::Receiver<TelephonyOutbound>,
) {
    let (event_tx, event_rx) = mpsc::channel(capacity);
    let (frame_tx, frame_rx) = mpsc::channel(capacity);
    (
        ChannelTelephonyStream { rx: event_rx },
        ChannelTelephonySink { tx: Some(frame_tx) },
        event_tx,
        frame_rx,
    )
}

#[async_trait]
impl TelephonyStream for ChannelTelephonyStream {
    async fn next_event(&mut self) -> Result<Option<TelephonyEvent>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

#[async_trait]
impl TelephonySink for ChannelTelephonySink {
    async fn send(&mut self, frame: TelephonyOutbound) -> Result<(), TransportError> {
        match &self.tx {
            Some(tx) => tx.send(frame).await.map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        Ok(())
    }
}

pub struct ChannelModelStream {
    rx: mpsc::Receiver<ModelEvent>,
}

pub struct ChannelModelSink {
    tx: Option<mpsc::Sender<ModelCommand>>,
}

/// Build a model channel pair, mirror of [`telephony_channel`]
pub fn model_channel(
    capacity: usize,
) -> (
    ChannelModelStream,
    ChannelModelSink,
    mpsc::Sender<ModelEvent>,
    mpsc::Receiver<ModelCommand>,
) {
    let (event_tx, event_rx) = mpsc::channel(capacity);
    let (command_tx, command_rx) = mpsc::channel(capacity);
    (
        ChannelModelStream { rx: event_rx },
        ChannelModelSink {
            tx: Some(command_tx),
        },
        event_tx,
        command_rx,
    )
}

#[async_trait]
impl ModelStream for ChannelModelStream {
    async fn next_event(&mut self) -> Result<Option<ModelEvent>, TransportError> {
        Ok(self.rx.recv().await)
    }
}

#[async_trait]
impl ModelSink for ChannelModelSink {
    async fn send(&mut self, command: ModelCommand) -> Result<(), TransportError> {
        match &self.tx {
            Some(tx) => tx.send(command).await.map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_telephony_pair_round_trip() {
        let (mut stream, mut sink, event_tx, mut frame_rx) = telephony_channel(8);

        event_tx.send(TelephonyEvent::Stop).await.unwrap();
        assert_eq!(stream.next_event().await.unwrap(), Some(TelephonyEvent::Stop));

        sink.send(TelephonyOutbound::clear("MZ1")).await.unwrap();
        assert_eq!(
            frame_rx.recv().await,
            Some(TelephonyOutbound::clear("MZ1"))
        );
    }

    #[tokio::test]
    async fn test_closed_sink_rejects_sends() {
        let (_stream, mut sink, _event_tx, mut frame_rx) = telephony_channel(8);
        sink.close().await.unwrap();
        assert!(sink.send(TelephonyOutbound::clear("MZ1")).await.is_err());
        assert!(frame_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_ends_when_peer_drops() {
        let (mut stream, _sink, event_tx, _frame_rx) = model_channel(8);
        drop(event_tx);
        assert_eq!(stream.next_event().await.unwrap(), None);
    }
}
