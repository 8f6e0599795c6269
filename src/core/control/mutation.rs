// Storage mutations produced by the deciders.
//
// Purpose
// - Describe every write a command needs as data, so a store can apply the batch atomically.
//
// Responsibilities
// - Apply a mutation to an in memory aggregate, rejecting writes to rows that do not exist.

use crate::core::control::entries::{ManualTimeEntry, TimeEntry};
use crate::core::control::state::{ControlAggregate, ControlRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SaveControl(ControlRecord),
    OpenTimeEntry(TimeEntry),
    CloseTimeEntry {
        entry_id: Uuid,
        end_time: DateTime<Utc>,
        duration_minutes: i64,
    },
    DeleteTimeEntry {
        entry_id: Uuid,
    },
    AddManualEntry(ManualTimeEntry),
    DeleteManualEntry {
        entry_id: Uuid,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error("row {0} does not exist")]
    MissingRow(Uuid),

    #[error("row {row} belongs to control {owner}, not {control_id}")]
    ForeignRow {
        row: Uuid,
        owner: Uuid,
        control_id: Uuid,
    },
}

/// The control record saved by a batch, if any.
pub fn saved_control(mutations: &[Mutation]) -> Option<&ControlRecord> {
    mutations.iter().rev().find_map(|mutation| match mutation {
        Mutation::SaveControl(record) => Some(record),
        _ => None,
    })
}

impl ControlAggregate {
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), ApplyError> {
        let control_id = self.record.id;
        let owned = |row: Uuid, owner: Uuid| {
            if owner == control_id {
                Ok(())
            } else {
                Err(ApplyError::ForeignRow {
                    row,
                    owner,
                    control_id,
                })
            }
        };
        match mutation {
            Mutation::SaveControl(record) => {
                if record.id != control_id {
                    return Err(ApplyError::ForeignRow {
                        row: record.id,
                        owner: record.id,
                        control_id,
                    });
                }
                self.record = record.clone();
            }
            Mutation::OpenTimeEntry(entry) => {
                owned(entry.id, entry.control_id)?;
                self.time_entries.push(entry.clone());
            }
            Mutation::CloseTimeEntry {
                entry_id,
                end_time,
                duration_minutes,
            } => {
                let entry = self
                    .time_entries
                    .iter_mut()
                    .find(|entry| entry.id == *entry_id)
                    .ok_or(ApplyError::MissingRow(*entry_id))?;
                entry.close(*end_time, *duration_minutes);
            }
            Mutation::DeleteTimeEntry { entry_id } => {
                let before = self.time_entries.len();
                self.time_entries.retain(|entry| entry.id != *entry_id);
                if self.time_entries.len() == before {
                    return Err(ApplyError::MissingRow(*entry_id));
                }
            }
            Mutation::AddManualEntry(entry) => {
                owned(entry.id, entry.control_id)?;
                self.manual_entries.push(entry.clone());
            }
            Mutation::DeleteManualEntry { entry_id } => {
                let before = self.manual_entries.len();
                self.manual_entries.retain(|entry| entry.id != *entry_id);
                if self.manual_entries.len() == before {
                    return Err(ApplyError::MissingRow(*entry_id));
                }
            }
        }
        Ok(())
    }

    /// Applies the whole batch or leaves the aggregate untouched.
    pub fn apply_all(&mut self, mutations: &[Mutation]) -> Result<(), ApplyError> {
        let mut next = self.clone();
        for mutation in mutations {
            next.apply(mutation)?;
        }
        *self = next;
        Ok(())
    }
}
