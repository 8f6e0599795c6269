// In memory implementation of the StatusVocabulary port.
//
// Purpose
// - Stand in for the external status table during tests and local development.

use crate::core::control::status::{StatusId, StatusNames};
use crate::core::ports::StatusVocabulary;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStatusVocabulary {
    rows: RwLock<HashMap<String, StatusId>>,
    is_offline: bool,
}

impl InMemoryStatusVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded with the default names, mapped to ids "1", "2" and "3".
    pub fn with_defaults() -> Self {
        Self::with_names(&StatusNames::default())
    }

    pub fn with_names(names: &StatusNames) -> Self {
        let rows = [&names.pending, &names.in_progress, &names.completed]
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), StatusId::new((i + 1).to_string())))
            .collect();
        Self {
            rows: RwLock::new(rows),
            is_offline: false,
        }
    }

    pub async fn define(&self, name: impl Into<String>, id: StatusId) {
        self.rows.write().await.insert(name.into(), id);
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }
}

#[async_trait::async_trait]
impl StatusVocabulary for InMemoryStatusVocabulary {
    async fn lookup(&self, name: &str) -> anyhow::Result<Option<StatusId>> {
        if self.is_offline {
            return Err(anyhow::anyhow!("Status vocabulary offline"));
        }
        Ok(self.rows.read().await.get(name).cloned())
    }
}
