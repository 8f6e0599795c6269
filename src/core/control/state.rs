// Control record and aggregate.
//
// Purpose
// - Hold the tracked time state for one assignment of a case or TODO to a user.
//
// Responsibilities
// - The record is the aggregate root; automatic and manual entries only exist under it.
// - An active timer always has a start timestamp and an in progress status.

use crate::core::control::entries::{ManualTimeEntry, TimeEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Case,
    Todo,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Case => write!(f, "case"),
            EntityKind::Todo => write!(f, "todo"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "case" => Ok(EntityKind::Case),
            "todo" => Ok(EntityKind::Todo),
            _ => Err(format!("Unknown entity kind: {s}")),
        }
    }
}

/// The case or TODO a control tracks time against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn case(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Case, id)
    }

    pub fn todo(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Todo, id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlStatus {
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlStatus::Pending => write!(f, "PENDING"),
            ControlStatus::InProgress => write!(f, "IN_PROGRESS"),
            ControlStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRecord {
    pub id: Uuid,
    pub entity: EntityRef,
    pub user_id: String,
    pub status: ControlStatus,
    pub total_time_minutes: i64,
    pub is_timer_active: bool,
    pub timer_start_at: Option<DateTime<Utc>>,
    pub assigned_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ControlRecord {
    pub fn new(
        id: Uuid,
        entity: EntityRef,
        user_id: impl Into<String>,
        assigned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            entity,
            user_id: user_id.into(),
            status: ControlStatus::Pending,
            total_time_minutes: 0,
            is_timer_active: false,
            timer_start_at: None,
            assigned_at,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ControlStatus::Completed
    }

    /// Start of the running segment, if the timer is running.
    pub fn running_since(&self) -> Option<DateTime<Utc>> {
        if self.is_timer_active {
            self.timer_start_at
        } else {
            None
        }
    }
}

/// A control record together with every entry that belongs to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlAggregate {
    pub record: ControlRecord,
    pub time_entries: Vec<TimeEntry>,
    pub manual_entries: Vec<ManualTimeEntry>,
}

impl ControlAggregate {
    pub fn new(record: ControlRecord) -> Self {
        Self {
            record,
            time_entries: Vec::new(),
            manual_entries: Vec::new(),
        }
    }

    /// The open entry with the latest start time.
    pub fn latest_open_entry(&self) -> Option<&TimeEntry> {
        self.time_entries
            .iter()
            .filter(|entry| entry.is_open())
            .max_by_key(|entry| (entry.start_time, entry.id))
    }

    pub fn time_entry(&self, entry_id: Uuid) -> Option<&TimeEntry> {
        self.time_entries.iter().find(|entry| entry.id == entry_id)
    }

    pub fn manual_entry(&self, entry_id: Uuid) -> Option<&ManualTimeEntry> {
        self.manual_entries.iter().find(|entry| entry.id == entry_id)
    }
}
