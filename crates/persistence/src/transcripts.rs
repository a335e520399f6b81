//! Conversation transcript storage

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use frontdesk_core::TranscriptEntry;

use crate::PersistenceError;

/// Transcript store trait for abstraction
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Full transcript for a conversation, oldest entry first.
    /// Unknown conversations yield an empty transcript.
    async fn load(&self, conversation_id: Uuid) -> Result<Vec<TranscriptEntry>, PersistenceError>;

    async fn append(
        &self,
        conversation_id: Uuid,
        entry: TranscriptEntry,
    ) -> Result<(), PersistenceError>;
}

/// In-memory implementation of the transcript store
#[derive(Clone, Default)]
pub struct InMemoryTranscripts {
    entries: Arc<RwLock<HashMap<Uuid, Vec<TranscriptEntry>>>>,
}

impl InMemoryTranscripts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscripts {
    async fn load(&self, conversation_id: Uuid) -> Result<Vec<TranscriptEntry>, PersistenceError> {
        Ok(self
            .entries
            .read()
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(
        &self,
        conversation_id: Uuid,
        entry: TranscriptEntry,
    ) -> Result<(), PersistenceError> {
        if entry.is_empty() {
            return Ok(());
        }
        self.entries
            .write()
            .entry(conversation_id)
            .or_default()
            .push(entry);
        tracing::debug!(%conversation_id, "transcript entry appended");
        Ok(())
    }
}
