// In memory implementation of the TrackedEntities port.
//
// Purpose
// - Stand in for the case and TODO tables: existence and the completed flag.
//
// Responsibilities
// - Reject writes to unknown entities unless built with `accepting_unknown`.

use crate::core::control::state::EntityRef;
use crate::core::ports::TrackedEntities;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityFlags {
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct InMemoryTrackedEntities {
    flags: RwLock<HashMap<EntityRef, EntityFlags>>,
    accept_unknown: bool,
    is_offline: AtomicBool,
}

impl InMemoryTrackedEntities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entity is treated as existing and is registered on first write.
    pub fn accepting_unknown() -> Self {
        Self {
            accept_unknown: true,
            ..Self::default()
        }
    }

    pub async fn register(&self, entity: EntityRef) {
        self.flags.write().await.entry(entity).or_default();
    }

    pub async fn flags(&self, entity: &EntityRef) -> Option<EntityFlags> {
        self.flags.read().await.get(entity).copied()
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> anyhow::Result<()> {
        if self.is_offline.load(Ordering::SeqCst) {
            anyhow::bail!("Tracked entities offline");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TrackedEntities for InMemoryTrackedEntities {
    async fn exists(&self, entity: &EntityRef) -> anyhow::Result<bool> {
        self.ensure_online()?;
        Ok(self.accept_unknown || self.flags.read().await.contains_key(entity))
    }

    async fn set_completed(
        &self,
        entity: &EntityRef,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        self.ensure_online()?;
        let mut guard = self.flags.write().await;
        if !self.accept_unknown && !guard.contains_key(entity) {
            anyhow::bail!("{entity} does not exist");
        }
        let flags = guard.entry(entity.clone()).or_default();
        flags.is_completed = completed;
        flags.completed_at = if completed { completed_at } else { None };
        Ok(())
    }
}
