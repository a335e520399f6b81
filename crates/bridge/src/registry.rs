//! Call registry
//!
//! Tracks live call sessions. Registration hands back a guard whose drop
//! removes the entry, so the registry can never leak a finished call,
//! whether the session ended normally, with an error or by cancellation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::BridgeError;

/// Metadata for one live call
#[derive(Debug, Clone)]
pub struct CallInfo {
    pub conversation_id: Uuid,
    pub assistant_id: Uuid,
    pub started_at: Instant,
}

impl CallInfo {
    pub fn new(conversation_id: Uuid, assistant_id: Uuid) -> Self {
        Self {
            conversation_id,
            assistant_id,
            started_at: Instant::now(),
        }
    }
}

/// Registry of live calls
#[derive(Clone)]
pub struct CallRegistry {
    calls: Arc<RwLock<HashMap<Uuid, CallInfo>>>,
    max_calls: usize,
}

impl CallRegistry {
    pub fn new(max_calls: usize) -> Self {
        Self {
            calls: Arc::new(RwLock::new(HashMap::new())),
            max_calls,
        }
    }

    /// Register a call. The returned guard removes the entry on drop.
    pub fn register(&self, info: CallInfo) -> Result<CallGuard, BridgeError> {
        let conversation_id = info.conversation_id;
        let mut calls = self.calls.write();

        if calls.len() >= self.max_calls {
            return Err(BridgeError::Session(format!(
                "call limit reached ({} live calls)",
                calls.len()
            )));
        }

        calls.insert(conversation_id, info);
        tracing::info!(%conversation_id, live = calls.len(), "call registered");

        Ok(CallGuard {
            calls: Arc::clone(&self.calls),
            conversation_id,
        })
    }

    pub fn get(&self, conversation_id: Uuid) -> Option<CallInfo> {
        self.calls.read().get(&conversation_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.calls.read().len()
    }

    pub fn list(&self) -> Vec<Uuid> {
        self.calls.read().keys().copied().collect()
    }
}

/// Removes its call from the registry when dropped
pub struct CallGuard {
    calls: Arc<RwLock<HashMap<Uuid, CallInfo>>>,
    conversation_id: Uuid,
}

impl CallGuard {
    pub fn conversation_id(&self) -> Uuid {
        self.conversation_id
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        let mut calls = self.calls.write();
        calls.remove(&self.conversation_id);
        tracing::info!(
            conversation_id = %self.conversation_id,
            live = calls.len(),
            "call removed"
        );
    }
}
