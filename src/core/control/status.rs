// Translation between the closed ControlStatus enum and the external status vocabulary.
//
// Purpose
// - Resolve the configured status names to external ids once, at start-up.
//
// Boundaries
// - Deciders only ever see ControlStatus. External ids appear in views and storage only.

use crate::core::control::state::ControlStatus;
use crate::core::ports::StatusVocabulary;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusId(String);

impl StatusId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names under which each status is stored in the external vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNames {
    pub pending: String,
    pub in_progress: String,
    pub completed: String,
}

impl Default for StatusNames {
    fn default() -> Self {
        Self {
            pending: "PENDIENTE".to_string(),
            in_progress: "EN CURSO".to_string(),
            completed: "TERMINADA".to_string(),
        }
    }
}

impl StatusNames {
    pub fn name_of(&self, status: ControlStatus) -> &str {
        match status {
            ControlStatus::Pending => &self.pending,
            ControlStatus::InProgress => &self.in_progress,
            ControlStatus::Completed => &self.completed,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("status {status} is missing from the vocabulary (looked up as {name:?})")]
    Missing { status: ControlStatus, name: String },

    #[error("status vocabulary unavailable: {0}")]
    Vocabulary(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCatalog {
    pending: StatusId,
    in_progress: StatusId,
    completed: StatusId,
}

impl StatusCatalog {
    pub async fn resolve<TVocabulary>(
        vocabulary: &TVocabulary,
        names: &StatusNames,
    ) -> Result<Self, CatalogError>
    where
        TVocabulary: StatusVocabulary + ?Sized,
    {
        Ok(Self {
            pending: lookup_id(vocabulary, names, ControlStatus::Pending).await?,
            in_progress: lookup_id(vocabulary, names, ControlStatus::InProgress).await?,
            completed: lookup_id(vocabulary, names, ControlStatus::Completed).await?,
        })
    }

    pub fn id_of(&self, status: ControlStatus) -> &StatusId {
        match status {
            ControlStatus::Pending => &self.pending,
            ControlStatus::InProgress => &self.in_progress,
            ControlStatus::Completed => &self.completed,
        }
    }

    pub fn status_of(&self, id: &StatusId) -> Option<ControlStatus> {
        [
            ControlStatus::Pending,
            ControlStatus::InProgress,
            ControlStatus::Completed,
        ]
        .into_iter()
        .find(|status| self.id_of(*status) == id)
    }
}

async fn lookup_id<TVocabulary>(
    vocabulary: &TVocabulary,
    names: &StatusNames,
    status: ControlStatus,
) -> Result<StatusId, CatalogError>
where
    TVocabulary: StatusVocabulary + ?Sized,
{
    let name = names.name_of(status);
    vocabulary
        .lookup(name)
        .await
        .map_err(|e| CatalogError::Vocabulary(format!("{e:#}")))?
        .ok_or_else(|| CatalogError::Missing {
            status,
            name: name.to_string(),
        })
}
