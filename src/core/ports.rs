// Ports define what the core needs from the outside world, without implementing it.
//
// Purpose
// - ControlStore: aggregate persistence with atomic, version checked batches.
// - StatusVocabulary: the external table of status names.
// - TrackedEntities: the owning case or TODO, for existence checks and the completed flag.
// - Clock: the current time, so deciders stay pure and tests stay deterministic.
//
// Boundaries
// - No concrete input or output here. Adapters implement these traits in the adapters layer.

use crate::core::control::entries::EntryKind;
use crate::core::control::mutation::{ApplyError, Mutation};
use crate::core::control::state::{ControlAggregate, ControlRecord, EntityRef};
use crate::core::control::status::StatusId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("version mismatch: expected {expected}, actual {actual}")]
    VersionMismatch { expected: i64, actual: i64 },

    #[error(transparent)]
    Rejected(#[from] ApplyError),

    #[error("{entity} already has a control for user {user_id}")]
    Duplicate { entity: EntityRef, user_id: String },

    #[error("control {control_id} is not accessible")]
    Forbidden { control_id: Uuid },

    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone)]
pub struct LoadedControl {
    pub aggregate: ControlAggregate,
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLocation {
    pub control_id: Uuid,
    pub kind: EntryKind,
}

#[async_trait]
pub trait ControlStore: Send + Sync {
    async fn load(&self, control_id: Uuid) -> Result<Option<LoadedControl>, StoreError>;

    /// Applies every mutation or none. A control that does not exist yet has version 0.
    async fn commit(
        &self,
        control_id: Uuid,
        expected_version: i64,
        mutations: &[Mutation],
    ) -> Result<(), StoreError>;

    async fn find_by_assignment(
        &self,
        entity: &EntityRef,
        user_id: &str,
    ) -> Result<Option<ControlRecord>, StoreError>;

    async fn list_by_user_id(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
        sort_by_assigned_at_desc: bool,
    ) -> Result<Vec<ControlAggregate>, StoreError>;

    async fn list_by_entity(&self, entity: &EntityRef)
    -> Result<Vec<ControlAggregate>, StoreError>;

    /// Finds the control owning an entry. Hidden rows are reported as absent.
    async fn locate_entry(&self, entry_id: Uuid) -> Result<Option<EntryLocation>, StoreError>;
}

#[async_trait]
pub trait StatusVocabulary: Send + Sync {
    async fn lookup(&self, name: &str) -> anyhow::Result<Option<StatusId>>;
}

#[async_trait]
pub trait TrackedEntities: Send + Sync {
    async fn exists(&self, entity: &EntityRef) -> anyhow::Result<bool>;

    async fn set_completed(
        &self,
        entity: &EntityRef,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
