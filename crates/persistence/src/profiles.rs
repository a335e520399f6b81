//! Assistant profile storage

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use frontdesk_core::AssistantProfile;

use crate::PersistenceError;

/// Profile store trait for abstraction
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profile(&self, assistant_id: Uuid) -> Result<AssistantProfile, PersistenceError>;

    async fn upsert_profile(&self, profile: AssistantProfile) -> Result<(), PersistenceError>;
}

/// In-memory implementation of the profile store
#[derive(Clone, Default)]
pub struct InMemoryProfiles {
    profiles: Arc<RwLock<HashMap<Uuid, AssistantProfile>>>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: AssistantProfile) -> Self {
        let store = Self::default();
        store.profiles.write().insert(profile.id, profile);
        store
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfiles {
    async fn load_profile(&self, assistant_id: Uuid) -> Result<AssistantProfile, PersistenceError> {
        self.profiles
            .read()
            .get(&assistant_id)
            .cloned()
            .ok_or_else(|| PersistenceError::NotFound(format!("assistant {assistant_id}")))
    }

    async fn upsert_profile(&self, profile: AssistantProfile) -> Result<(), PersistenceError> {
        tracing::debug!(assistant_id = %profile.id, name = %profile.name, "profile stored");
        self.profiles.write().insert(profile.id, profile);
        Ok(())
    }
}
